//! CLI module for the content agency.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Content Agency - LLM agents for content research and drafting
///
/// A content manager agent backed by trend and YouTube analysts, available
/// over an HTTP chat API or directly from the terminal.
#[derive(Parser, Debug)]
#[command(name = "agency")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace; default from general.log_level)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "AGENCY_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP chat API
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Send a single prompt to the agency
    Ask {
        /// The prompt to send
        prompt: String,

        /// Address a specific agent instead of the content manager
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Start an interactive chat session
    Chat,

    /// List the registered analysis tools
    Tools,

    /// Run one analysis tool directly
    Tool {
        /// Tool name (see `agency tools`)
        name: String,

        /// JSON arguments for the tool
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Generate a short video from a script
    Video {
        /// Script text, or @path to read it from a file
        script: String,

        /// Visual style of the video
        #[arg(long, default_value = "educational")]
        style: String,

        /// Target duration, e.g. "5 seconds"
        #[arg(long, default_value = "5 seconds")]
        duration: String,

        /// Aspect ratio (16:9 or 9:16)
        #[arg(long, default_value = "16:9")]
        aspect_ratio: String,

        /// Allow people and faces in the generated video
        #[arg(long)]
        allow_faces: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tool_with_input() {
        let cli = Cli::try_parse_from([
            "agency",
            "-vv",
            "tool",
            "keyword_extractor",
            "--input",
            r#"{"text": "rust"}"#,
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Tool { name, input } => {
                assert_eq!(name, "keyword_extractor");
                assert_eq!(input.as_deref(), Some(r#"{"text": "rust"}"#));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_video_defaults() {
        let cli = Cli::try_parse_from(["agency", "video", "A short intro"]).unwrap();
        match cli.command {
            Commands::Video {
                style,
                duration,
                aspect_ratio,
                allow_faces,
                ..
            } => {
                assert_eq!(style, "educational");
                assert_eq!(duration, "5 seconds");
                assert_eq!(aspect_ratio, "16:9");
                assert!(!allow_faces);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
