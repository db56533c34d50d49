//! unilist - Unified adblock filter list generator
//!
//! Fetches filter lists in several syntaxes, normalizes them to canonical
//! uBlock Origin rules, resolves conflicts, and emits one sectioned list.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use unilist::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Generate {
            output,
            no_cache,
            dry_run,
            stats,
        } => {
            unilist::commands::generate::run(&cli.config, output, no_cache, dry_run, stats).await
        }
        Commands::Check { rule, dialect } => unilist::commands::check::run(&rule, &dialect),
        Commands::Stats => unilist::commands::stats::run(&cli.config),
        Commands::CleanCache => unilist::commands::cache::run(&cli.config),
        Commands::Version => {
            println!("unilist {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
