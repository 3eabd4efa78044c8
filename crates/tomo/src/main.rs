//! tomo - command-line client for the tomo control plane.

mod commands;
mod runner;

use clap::{Parser, Subcommand};
use commands::Credentials;
use runner::Runtime;
use std::path::PathBuf;
use tomo_util::log::{self, LogConfig, LogLevel};
use tomo_util::Config;
use tracing::debug;

#[derive(Parser)]
#[command(name = "tomo")]
#[command(author, version, about = "Control-plane client for tomo", long_about = None)]
struct Cli {
    /// Tool Protocol endpoint (overrides config and TOMO_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Config file to load on top of the global one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Negotiate a session and report
    Ping,
    /// Log in as admin and show the principal
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Call a tool as admin and print the result as JSON
    Call {
        /// Tool name
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.server.url = Some(url);
    }
    init_logging(&config, cli.verbose);
    debug!(?sources, url = config.server_url(), "Configuration loaded");

    let runtime = Runtime::new(&config, tomo_mcp::registry::global())?;
    let result = match &cli.command {
        Commands::Ping => commands::handle_ping(&runtime).await,
        Commands::Login { credentials } => commands::handle_login(&runtime, credentials).await,
        Commands::Call {
            tool,
            args,
            credentials,
        } => commands::handle_call(&runtime, credentials, tool, args.as_deref()).await,
    };
    runtime.shutdown().await;
    result
}

/// Log to the default log file, and to stderr with `--verbose`.
fn init_logging(config: &Config, verbose: bool) {
    let level = match (verbose, config.log_level()) {
        (true, LogLevel::Trace) => LogLevel::Trace,
        (true, _) => LogLevel::Debug,
        (false, level) => level,
    };
    let log_config = LogConfig {
        print: verbose,
        level,
        include_location: verbose,
        file: log::default_log_path(),
    };
    if let Err(e) = log::init(log_config) {
        eprintln!("Warning: Could not initialize logging: {}", e);
    }
}
