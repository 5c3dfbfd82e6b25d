//! pilad - the piladb server binary
//!
//! # Examples
//!
//! ```bash
//! # Start server
//! pilad serve --bind 0.0.0.0 --port 1205
//!
//! # Show version
//! pilad version
//! ```

use clap::{Args, Parser, Subcommand};
use piladb::pila::Pila;
use piladb::server::{start_server, ServerConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// piladb - an in-memory database of stacks
#[derive(Parser, Debug)]
#[command(name = "pilad")]
#[command(version = piladb::VERSION)]
#[command(about = "piladb - an in-memory database of stacks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "PILADB_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the piladb server
    Serve(ServeArgs),

    /// Show server version
    Version,
}

/// Server configuration arguments
#[derive(Args, Debug)]
struct ServeArgs {
    /// HTTP bind address
    #[arg(short, long, default_value = "127.0.0.1", env = "PILADB_BIND")]
    bind: String,

    /// HTTP port
    #[arg(short, long, default_value = "1205", env = "PILADB_PORT")]
    port: u16,

    /// Enable permissive CORS
    #[arg(long)]
    cors: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Maximum request body size (MB)
    #[arg(long, default_value = "10")]
    max_body_size: usize,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            http_addr: args.bind,
            http_port: args.port,
            enable_cors: args.cors,
            max_body_size: args.max_body_size * 1024 * 1024,
            timeout_secs: args.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            // Keep the guard alive so buffered log lines are flushed on exit
            let _guard = setup_logging(&cli.log_dir, &cli.log_level, cli.no_color)?;
            serve_command(args).await
        }
        Commands::Version => {
            println!("piladb {}", piladb::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and console output
fn setup_logging(
    log_dir: &Path,
    log_level: &str,
    no_color: bool,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "pilad.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let log_level = log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(!no_color),
        )
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(guard)
}

/// Serve command - start the piladb server
async fn serve_command(args: ServeArgs) -> anyhow::Result<()> {
    info!(version = %piladb::VERSION, "piladb starting");

    let pila = Pila::new();
    let config = ServerConfig::from(args);

    start_server(config, pila).await
}
