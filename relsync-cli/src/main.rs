//! relsync CLI - command-line interface
//!
//! Keeps GitHub-released components merged into an installation directory.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relsync::config::config_file_path;
use relsync::logging;

use commands::common::load_config;
use commands::install::InstallArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "relsync")]
#[command(version, about = "Keeps GitHub-released components installed and up to date", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/relsync/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize all configured components, polling until interrupted
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Install a local archive as the current version of a component
    Install {
        /// Archive to install; its file name is the version (e.g. v2.1.0.zip)
        archive: PathBuf,

        /// Component identifier (owner/name)
        #[arg(long)]
        repo: String,

        /// Install sub-path relative to the installation directory
        #[arg(long)]
        path: Option<String>,
    },

    /// Show configured components and their recorded versions
    Status,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);
    let config = load_config(Some(&config_path))?;

    // Keep the file writer alive until exit so buffered lines are flushed.
    let _log_guard = logging::init_logging(cli.verbose, config.paths.log_dir.as_deref())
        .map_err(|e| CliError::Logging(e.to_string()))?;

    match cli.command {
        Commands::Run { once } => commands::run::run(&config, once),
        Commands::Install {
            archive,
            repo,
            path,
        } => commands::install::run(&config, InstallArgs { archive, repo, path }),
        Commands::Status => commands::status::run(&config, &config_path),
    }
}
