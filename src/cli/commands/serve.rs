//! HTTP API server.

use super::build_agency;
use crate::api::{self, AppState};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{ChatService, MemorySessionStore};
use crate::video::VeoClient;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server until Ctrl+C.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let (agency, tools) = build_agency(&settings)?;

    let store = Arc::new(MemorySessionStore::with_capacity_limit(
        settings.sessions.max_sessions,
    ));
    let state = AppState {
        chat: Arc::new(ChatService::new(store, agency)),
        tools,
        video: Arc::new(VeoClient::from_settings(&settings)?),
    };
    let app = api::router(state, &settings.server.cors_origins);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting API server on {}", addr);

    Output::header("Content Creation Agency API");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat", "POST /api/chat");
    Output::kv("History", "GET  /api/chat/history/{sessionId}");
    Output::kv("New session", "POST /api/chat/session");
    Output::kv("Generate video", "POST /api/generate-video");
    Output::kv("Tools", "GET  /api/tools");
    Output::kv("Run tool", "POST /api/tools/{name}");
    Output::kv("Health", "GET  /api/health");
    Output::kv("CORS origins", &settings.server.cors_origins.join(", "));
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down API server");
        })
        .await?;

    Ok(())
}
