//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PostgreSQL → metadata-catalog bridge CLI
#[derive(Parser, Debug)]
#[command(name = "atlas-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); built-in defaults are used when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base name for report output files
    #[arg(short, long, global = true, default_value = "discovery_report")]
    pub output: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands; the full pipeline runs when none is given
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run extraction, cataloging, and report generation in sequence
    Run,

    /// Test connectivity to the catalog and the source database
    Check,

    /// Catalog the source schema without generating a report
    Catalog,

    /// Generate the discovery report from current catalog state
    Report,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_args_parses() {
        let cli = Cli::parse_from(["atlas-bridge"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.output, "discovery_report");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_subcommand_and_flags() {
        let cli = Cli::parse_from([
            "atlas-bridge",
            "--config",
            "prod.yaml",
            "--output",
            "nightly",
            "catalog",
        ]);
        assert!(matches!(cli.command, Some(Commands::Catalog)));
        assert_eq!(cli.config.unwrap(), PathBuf::from("prod.yaml"));
        assert_eq!(cli.output, "nightly");
    }
}
