//! devstack CLI
//!
//! Single binary for the local development stack:
//! - `up` starts the cache server, installs dependencies, and supervises
//!   the dashboard and API server until they exit or a signal arrives
//! - `stop` and `status` inspect or stop a running instance
//! - `config` manages the configuration file

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devstack::commands::{self, UpOverrides};

#[derive(Parser)]
#[command(name = "devstack")]
#[command(author, version, about = "Run a cache server, dashboard and API side by side")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the stack in the foreground
    /// Alias: start
    #[command(alias = "start")]
    Up {
        /// Do not run the dependency installer
        #[arg(long)]
        skip_install: bool,
        /// Do not check for or start the cache server
        #[arg(long)]
        no_cache: bool,
        /// Stop before launching anything if the installer fails
        #[arg(long)]
        abort_on_install_failure: bool,
        /// Dashboard port (overrides config)
        #[arg(long)]
        ui_port: Option<u16>,
        /// API bind host (overrides config)
        #[arg(long)]
        api_host: Option<String>,
        /// API port (overrides config)
        #[arg(long)]
        api_port: Option<u16>,
    },

    /// Stop a running stack
    Stop,

    /// Show which components are running
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get specific config value
    Get { key: String },
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli.config.as_deref();

    // Handle no command - show status
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            commands::status_command(config_path, false).await?;
            return Ok(());
        }
    };

    match command {
        Commands::Up {
            skip_install,
            no_cache,
            abort_on_install_failure,
            ui_port,
            api_host,
            api_port,
        } => {
            let overrides = UpOverrides {
                skip_install,
                no_cache,
                abort_on_install_failure,
                ui_port,
                api_host,
                api_port,
            };
            let code = commands::up_command(config_path, &overrides, cli.quiet).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Stop => {
            commands::stop_command(config_path)?;
        }

        Commands::Status { json } => {
            commands::status_command(config_path, json).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(config_path)?;
            }
            ConfigAction::Get { key } => {
                commands::config_get(config_path, &key)?;
            }
            ConfigAction::Init { force } => {
                commands::config_init(config_path, force)?;
            }
            ConfigAction::Path => {
                commands::config_path(config_path);
            }
        },
    }

    Ok(())
}
