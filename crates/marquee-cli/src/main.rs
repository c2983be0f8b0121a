//! Marquee CLI - Terminal OTT Demo
//!
//! Features:
//! - Catalog listing
//! - Title details
//! - Simulated playback with transport controls and an auto-hiding overlay

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod player;

/// Marquee CLI - OTT demo player
#[derive(Parser)]
#[command(name = "marquee")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Browse the demo catalog and drive the playback state machine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog
    List,

    /// Show details for one title
    Show {
        /// Media id
        id: String,
    },

    /// Play a title against the simulated media component
    Play {
        /// Media id
        id: String,

        /// Relative seek (seconds) issued after the media loads
        #[arg(short, long, allow_hyphen_values = true)]
        seek: Option<f64>,

        /// Fail playback with this message after the first progress event
        #[arg(long)]
        fail: Option<String>,

        /// Content seconds played per real second
        #[arg(long, default_value = "60")]
        speed: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    marquee_core::init();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List => {
            commands::list(&config, &cli.format).await?;
        }
        Commands::Show { id } => {
            commands::show(&config, &id, &cli.format).await?;
        }
        Commands::Play { id, seek, fail, speed } => {
            let options = player::PlayOptions { seek, fail, speed };
            commands::play(&config, &id, options, &cli.format).await?;
        }
    }

    Ok(())
}
