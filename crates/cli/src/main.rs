mod app;
mod config;
mod plain;
mod tui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use tradewatch_render::{Theme, ThemeSignal, ViewKind};

use crate::app::App;
use crate::config::{AppConfig, Overrides};

#[derive(Parser)]
#[command(name = "tradewatch")]
#[command(about = "Live trade monitor: open positions, trade history, and MT5 account status")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Append logs to this file (the interactive view discards logs otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, env = "TRADEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Push-data endpoint (e.g. "ws://localhost:8765")
    #[arg(long, env = "TRADEWATCH_URL")]
    url: Option<String>,

    /// Seconds to wait before reconnecting after a disconnect
    #[arg(long)]
    reconnect_delay: Option<u64>,

    /// Color theme (light, dark)
    #[arg(long)]
    theme: Option<Theme>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connection status, account summary, and open positions
    Monitor {
        /// Stream plain-text frames to stdout instead of the interactive view
        #[arg(long)]
        plain: bool,
    },

    /// Closed positions
    History {
        /// Stream plain-text frames to stdout instead of the interactive view
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (kind, plain) = match cli.command {
        Commands::Monitor { plain } => (ViewKind::Monitor, plain),
        Commands::History { plain } => (ViewKind::History, plain),
    };
    let interactive = !plain && std::io::stdout().is_terminal();

    init_tracing(&cli.log_level, cli.log_file.as_deref(), interactive)?;
    if !plain && !interactive {
        tracing::warn!("stdout is not a terminal, falling back to plain output");
    }

    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(Overrides {
        url: cli.url,
        reconnect_delay_secs: cli.reconnect_delay,
        theme: cli.theme,
    });
    config.validate()?;

    let app = App::mount(kind, config.feed, ThemeSignal::new(config.ui.theme));
    let result = if interactive {
        tui::run(&app).await
    } else {
        plain::run(&app).await
    };
    app.unmount().await;

    result
}

fn init_tracing(level: &str, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_target(false);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}
