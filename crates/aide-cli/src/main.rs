//! aide CLI entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use aide_agent::OpenRouterClient;
use aide_cli::assistants::{self, Roster};
use aide_cli::chat;
use aide_cli::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Load .env.local if it exists (for OPENROUTER_API_KEY etc.).
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    fmt().with_env_filter(filter).with_target(false).init();

    let model = match OpenRouterClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let roster = assistants::build_roster(model).await;

    let result = match cli.command {
        Some(Commands::Ask { message, assistant }) => match roster.get(&assistant) {
            Some(target) => chat::ask(&roster, target, &message).await,
            None => unknown_assistant(&assistant),
        },
        Some(Commands::Chat { assistant }) => match roster.get(&assistant) {
            Some(target) => chat::chat(&roster, target).await,
            None => unknown_assistant(&assistant),
        },
        Some(Commands::Tools) => {
            chat::print_tools(&roster.chief_of_staff);
            println!();
            chat::print_tools(&roster.strategist);
            Ok(())
        }
        // No command: chat with the Chief of Staff.
        None => chat::chat(&roster, &roster.chief_of_staff).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn unknown_assistant(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    Err(format!(
        "unknown assistant '{name}'; available: {}",
        Roster::names().join(", ")
    )
    .into())
}
