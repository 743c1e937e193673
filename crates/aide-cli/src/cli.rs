//! Command-line argument definitions.

use clap::{Parser, Subcommand};

/// aide: an AI chief-of-staff assistant suite.
#[derive(Parser, Debug)]
#[command(name = "aide", version, about = "AI chief-of-staff assistant suite")]
pub struct Cli {
    /// Subcommand; defaults to interactive chat.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level when RUST_LOG is not set.
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat interactively with an assistant.
    Chat {
        /// Assistant to talk to: chief-of-staff or strategist.
        #[arg(long, default_value = "chief-of-staff")]
        assistant: String,
    },

    /// Send a single message and print the response.
    Ask {
        /// The message to send.
        message: String,

        /// Assistant to talk to: chief-of-staff or strategist.
        #[arg(long, default_value = "chief-of-staff")]
        assistant: String,
    },

    /// List the tools each assistant exposes.
    Tools,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();

        let cli = Cli::parse_from(["aide", "ask", "hello"]);
        match cli.command {
            Some(Commands::Ask { message, assistant }) => {
                assert_eq!(message, "hello");
                assert_eq!(assistant, "chief-of-staff");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_chat_assistant_flag() {
        let cli = Cli::parse_from(["aide", "chat", "--assistant", "strategist"]);
        match cli.command {
            Some(Commands::Chat { assistant }) => assert_eq!(assistant, "strategist"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
