//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "unilist")]
#[command(author, version, about = "Unified adblock filter list generator")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "sources.json", global = true)]
    pub config: PathBuf,

    /// Quiet mode (for cron/systemd timer)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all sources and generate the unified filter list
    Generate {
        /// Output file (overrides settings.output_file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore the cache and refetch every source
        #[arg(long)]
        no_cache: bool,

        /// Run the full pipeline but don't write the output file
        #[arg(long)]
        dry_run: bool,

        /// Print run statistics after generation
        #[arg(long)]
        stats: bool,
    },

    /// Parse a single rule and show its canonical form
    Check {
        /// Raw rule text
        rule: String,

        /// Source dialect to interpret the rule as (ublock, abp, adguard, hosts)
        #[arg(long, short, default_value = "ublock")]
        dialect: String,
    },

    /// Show statistics from the last generation run
    Stats,

    /// Remove all cached source downloads
    CleanCache,

    /// Show version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses_help() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_version_command() {
        let cli = Cli::try_parse_from(["unilist", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_generate_defaults() {
        let cli = Cli::try_parse_from(["unilist", "generate"]).unwrap();
        match cli.command {
            Commands::Generate {
                output,
                no_cache,
                dry_run,
                stats,
            } => {
                assert!(output.is_none());
                assert!(!no_cache);
                assert!(!dry_run);
                assert!(!stats);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_generate_flags() {
        let cli = Cli::try_parse_from([
            "unilist",
            "generate",
            "--no-cache",
            "--dry-run",
            "--output",
            "out/list.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                output,
                no_cache,
                dry_run,
                ..
            } => {
                assert_eq!(output.unwrap().to_str().unwrap(), "out/list.txt");
                assert!(no_cache);
                assert!(dry_run);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_check_command() {
        let cli = Cli::try_parse_from(["unilist", "check", "||ads.example^$3p"]).unwrap();
        match cli.command {
            Commands::Check { rule, dialect } => {
                assert_eq!(rule, "||ads.example^$3p");
                assert_eq!(dialect, "ublock");
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_check_with_dialect() {
        let cli = Cli::try_parse_from([
            "unilist",
            "check",
            "0.0.0.0 ads.example.com",
            "--dialect",
            "hosts",
        ])
        .unwrap();
        match cli.command {
            Commands::Check { dialect, .. } => {
                assert_eq!(dialect, "hosts");
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_clean_cache_command() {
        let cli = Cli::try_parse_from(["unilist", "clean-cache"]).unwrap();
        assert!(matches!(cli.command, Commands::CleanCache));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "unilist",
            "-q",
            "-v",
            "--config",
            "/custom/sources.json",
            "stats",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert!(cli.verbose);
        assert_eq!(cli.config.to_str().unwrap(), "/custom/sources.json");
    }
}
