//! tagscope: namespace-scoped fluentd configuration rewriter
//!
//! A CLI tool that takes the fluentd fragment a namespace owns, checks it only
//! routes that namespace's logs, expands its tag macros and rewrites
//! `detect_exceptions` filters into directives a shared pipeline can route.

mod cli;
mod config;
mod domain;
mod service;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use config::ConfigService;
use service::RewriteService;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = ConfigService::load(cli.config.as_deref())?;

    // Initialize logging if debug mode
    if cli.debug || config.debug {
        domain::logger::init(&config)?;
    }

    // Execute command
    match cli.command {
        Commands::Process {
            namespace,
            strict,
            input,
            input_format,
            output_format,
        } => {
            let service = RewriteService::new(config, input_format, output_format)?;
            service.run(&namespace, strict, input.as_deref())?;
        }
        Commands::Hash { owner, value } => {
            println!("{}", domain::naming::hash(&owner, &value));
        }
        Commands::Init { path } => {
            let config_path = path.unwrap_or_else(ConfigService::default_path);
            ConfigService::generate_at(&config_path)?;
            if !cli.quiet {
                eprintln!("Configuration file created at: {}", config_path.display());
            }
        }
        Commands::Check => {
            config::validate(&config)?;
            if !cli.quiet {
                eprintln!("Configuration is valid.");
            }
        }
        Commands::Version => {
            println!("tagscope {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
