//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Namespace-scoped fluentd configuration rewriter
#[derive(Parser)]
#[command(
    name = "tagscope",
    version,
    about = "Namespace-scoped fluentd configuration rewriter",
    long_about = "A CLI tool that validates a namespace's fluentd fragment, expands its tag macros \
                  ($thisns, $labels, $from) and rewrites detect_exceptions filters into \
                  routable directives."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

/// Representation of a directive fragment on input or output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// fluentd configuration syntax (default)
    #[default]
    Text,
    /// JSON array of directives
    Json,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite a namespace fragment (alias: run)
    #[command(alias = "run")]
    Process {
        /// Namespace that owns the fragment
        #[arg(long, short = 'n')]
        namespace: String,

        /// Only allow <match> and <filter> at the top level
        #[arg(long)]
        strict: bool,

        /// Fragment file to read (default: stdin)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Input format
        #[arg(long, default_value = "text")]
        input_format: Format,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: Format,
    },
    /// Print the tag hash of a value for an owner
    Hash {
        /// Owner scope of the hash (e.g. a processor key)
        owner: String,
        /// Value to hash
        value: String,
    },
    /// Generate default configuration file
    Init {
        /// Path where to create the configuration file
        #[arg(long, short = 'p')]
        path: Option<PathBuf>,
    },
    /// Validate configuration file
    Check,
    /// Display version information
    Version,
}
