//! Patrol - Telegram inspection-checklist bot with AI-generated summaries.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use patrol::{App, Catalog, Settings};

/// Telegram inspection-checklist bot with AI-generated summaries
#[derive(Parser)]
#[command(name = "patrol")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML checklist catalog (defaults to the built-in one)
    #[arg(long, global = true, env = "PATROL_CATALOG")]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run,

    /// Validate configuration and catalog, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    dotenvy::dotenv().ok();

    // Both secrets are required; refuse to start without them.
    let settings = Settings::from_env()?;

    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::default(),
    };
    catalog.validate()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Check => {
            println!("configuration OK");
            println!("  checklist items: {}", catalog.len());
            println!("  model:           {}", settings.model);
            println!("  endpoint:        {}", settings.openai_base_url);
            println!("  summary timeout: {}s", settings.summary_timeout.as_secs());
            Ok(())
        }
        Commands::Run => App::new(&settings, catalog).run().await,
    }
}
