use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use anime_guesser::commands::{self, AppState};
use anime_guesser::config::resolve_config;
use anime_guesser::{init_tracing, repl, view};

#[derive(Parser)]
#[command(name = "anime-guesser", version, about = "Identify anime characters from images")]
struct Cli {
    /// Config file (defaults to the user config dir, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Recognition API base URL, overriding config and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one image and print the result
    Analyze {
        image: PathBuf,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the recognition service is up
    Health,
    /// Ask the service to rebuild its character database
    RefreshDb,
    /// Interactive session with focus/exclude refinement (default)
    Interactive { image: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.service.api_url = url;
        config.validate()?;
    }
    info!("Using recognition API at {}", config.service.api_url);

    let state = AppState::from_config(&config)?;

    match cli.command.unwrap_or(Command::Interactive { image: None }) {
        Command::Analyze { image, json } => {
            let result = commands::analyze_image(&state, image)
                .await
                .map_err(anyhow::Error::msg)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", view::render_result(&state.snapshot()));
            }
            if !result.success {
                std::process::exit(1);
            }
        }
        Command::Health => {
            let health = commands::check_health(&state)
                .await
                .map_err(anyhow::Error::msg)?;
            println!(
                "{}: {}",
                health.service.as_deref().unwrap_or("recognition API"),
                health.status
            );
            if !health.is_healthy() {
                bail!("Service reported status '{}'", health.status);
            }
        }
        Command::RefreshDb => {
            let outcome = commands::refresh_database(&state)
                .await
                .map_err(anyhow::Error::msg)?;
            if !outcome.success {
                bail!(
                    "Database refresh failed: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            println!(
                "{}",
                outcome.message.as_deref().unwrap_or("Database refreshed")
            );
        }
        Command::Interactive { image } => {
            repl::run_interactive(&state, image)
                .await
                .context("Interactive session failed")?;
        }
    }
    Ok(())
}
