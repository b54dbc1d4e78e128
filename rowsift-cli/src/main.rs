use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rowsift::config::Config;

mod commands;
mod utils;

use commands::{search::SearchArgs, CriteriaArgs};

/// rowsift - member search with optional criteria and count-eliding pagination
#[derive(Parser)]
#[command(name = "rowsift")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file; replaces ./rowsift.toml and the XDG config file
    #[arg(long, global = true, value_name = "FILE", env = "ROWSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search members and print one page of results
    Search(SearchArgs),
    /// Print the filter composed from the given criteria
    Compose(CriteriaArgs),
    /// Print shell completions to stdout
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: clap_complete::Shell,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    if cli.verbose {
        config.service.log_level = "debug".to_string();
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    rowsift::observability::init_tracing(&config)?;

    match cli.command {
        Commands::Search(args) => commands::search::execute(args, &config).await,
        Commands::Compose(args) => commands::compose::execute(&args),
        Commands::Completions { shell } => commands::completions(shell),
    }
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            // Show context if available
            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}
