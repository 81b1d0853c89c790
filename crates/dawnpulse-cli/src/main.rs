//! dawnpulse - keeps reward-extension accounts alive.
//!
//! Launches one keep-alive loop per configured account and, when a bot
//! token is configured, a Telegram bot that reports point balances. Runs
//! until Ctrl-C.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dawnpulse_core::bot::Bot;
use dawnpulse_core::{Config, PointAggregator, Supervisor};

// ============================================================================
// Constants
// ============================================================================

/// Log filter used when RUST_LOG is unset
const DEFAULT_LOG_FILTER: &str = "info,dawnpulse_core=debug";

/// File name used when --log-file points at a directory
const DEFAULT_LOG_FILE: &str = "dawnpulse.log";

/// Keep-alive client for reward-extension accounts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file path (defaults to ./config.json, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write logs to this file, rotated daily
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Don't start the chat bot even if a token is configured
    #[arg(long)]
    no_bot: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the keep-alive loops (default)
    Run,
    /// Print the point summary for every account and exit
    Points,
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (dir, name) = split_log_path(path);
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Directory and file-name prefix for the rolling appender
fn split_log_path(path: &Path) -> (PathBuf, String) {
    if path.is_dir() {
        return (path.to_path_buf(), DEFAULT_LOG_FILE.to_string());
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
    (dir, name)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_deref());

    // Configuration errors are fatal
    let config = Config::load(args.config.as_deref())?;

    match args.command.unwrap_or(Command::Run) {
        Command::Points => print_points(&config).await,
        Command::Run => run(config, args.no_bot).await,
    }
}

async fn print_points(config: &Config) -> Result<()> {
    let aggregator = PointAggregator::from_config(config)?;
    println!("{}", aggregator.summary().await);
    Ok(())
}

async fn run(config: Config, no_bot: bool) -> Result<()> {
    info!(accounts = config.accounts.len(), "dawnpulse starting");

    let supervisor = Supervisor::launch(&config)?;

    let bot_task = match config.bot_token.as_deref() {
        Some(token) if !no_bot => {
            let bot = Bot::new(token, PointAggregator::from_config(&config)?)?;
            Some(tokio::spawn(bot.run(supervisor.subscribe())))
        }
        _ => None,
    };

    serve(supervisor, bot_task, tokio::signal::ctrl_c()).await;
    info!("dawnpulse shut down");
    Ok(())
}

/// Keep every task running until `signal` fires, then stop and join them.
/// Loops that give up on their account exit on their own; the process stays up.
async fn serve<S>(supervisor: Supervisor, bot_task: Option<JoinHandle<()>>, signal: S)
where
    S: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C; stop the process with a kill signal");
            std::future::pending::<()>().await;
        }
    }

    supervisor.shutdown().await;
    if let Some(task) = bot_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Chat bot task failed");
        }
    }
}
