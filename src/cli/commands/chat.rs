//! Interactive terminal chat over the same session service as the HTTP API.

use super::build_agency;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{ChatService, MemorySessionStore, Role};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let (agency, _tools) = build_agency(&settings)?;
    let store = Arc::new(MemorySessionStore::with_capacity_limit(
        settings.sessions.max_sessions,
    ));
    let chat = ChatService::new(store, agency);
    let mut session_id = chat.create_session().await?;

    println!("\n{}", style("Content Agency Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your message, or 'exit' to quit. Use 'new' to start a new session and 'history' to review this one.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("new") {
            session_id = chat.create_session().await?;
            Output::info(&format!("Started session {}", session_id));
            continue;
        }

        if input.eq_ignore_ascii_case("history") {
            for message in chat.get_history(&session_id).await? {
                let speaker = match message.role {
                    Role::User => style("You").green(),
                    Role::Assistant => style("Agency").cyan(),
                };
                println!(
                    "{} {}: {}",
                    style(message.timestamp.format("%H:%M:%S")).dim(),
                    speaker,
                    message.content
                );
            }
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = chat.post_message(Some(&session_id), input).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => {
                session_id = reply.session_id;
                Output::reply("Agency", &reply.message.content);
            }
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    Ok(())
}
