//! Command-line argument parsing for school-rag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::retrieval::DEFAULT_TOP_K;

/// school-rag - answer questions about a school from its indexed documents
#[derive(Parser, Debug)]
#[command(name = "school-rag")]
#[command(version)]
#[command(about = "Semantic retrieval over a school's Qdrant collection, with a WhatsApp relay", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.school-rag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single retrieval and print the results as JSON
    Query {
        /// Question to answer
        text: String,

        /// Maximum number of passages
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K, allow_negative_numbers = true)]
        top_k: i64,
    },

    /// Link a WhatsApp account to the relay by scanning a QR code
    WhatsappLogin {
        /// Where to write the QR payload
        #[arg(long, default_value = "whatsapp_qr.txt")]
        qr_output: PathBuf,

        /// Seconds between status checks
        #[arg(long, default_value_t = 5)]
        poll_secs: u64,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn test_verbosity_quiet() {
        assert_eq!(parse(&["school-rag", "-q", "config"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["school-rag", "config"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["school-rag", "-v", "config"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["school-rag", "-vv", "config"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_serve_overrides() {
        let args = parse(&["school-rag", "serve", "--port", "9000"]);
        assert_eq!(
            args.command,
            Commands::Serve {
                host: None,
                port: Some(9000)
            }
        );
    }

    #[test]
    fn test_query_default_top_k() {
        let args = parse(&["school-rag", "query", "When does school start?"]);
        assert_eq!(
            args.command,
            Commands::Query {
                text: "When does school start?".to_string(),
                top_k: 3
            }
        );
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = parse(&["school-rag", "query", "x", "-k", "5", "--config", "/tmp/rag.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/rag.toml")));
        assert!(matches!(args.command, Commands::Query { top_k: 5, .. }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["school-rag"]).is_err());
    }
}
