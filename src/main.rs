//! MLX3 Bridge
//!
//! Forwards MLX3 remote buttons to a peer control system and mirrors peer
//! feedback onto the remote.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use mlx3_bridge::cli::{self, Command};
use mlx3_bridge::config::{AppConfig, ConfigWatcher, LoggingConfig};
use mlx3_bridge::endpoint::{ConsolePeer, ConsoleRemote};
use mlx3_bridge::gateway::Gateway;
use mlx3_bridge::log::TracingLog;

/// MLX3 Bridge - MLX3 remote to peer system signal bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run without the interactive console
    #[arg(long)]
    headless: bool,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if args.check_config {
        return check_config(&args.config).await;
    }

    let initial_config = AppConfig::load(&args.config).await?;

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = init_logging(&args.log_level, &initial_config.logging)?;

    info!("Starting MLX3 Bridge...");
    info!("Configuration file: {}", args.config);

    // Started after logging so its own messages are recorded
    let config_watcher = ConfigWatcher::watch(args.config.clone())?;

    run_app(initial_config, config_watcher, args.headless).await?;

    info!("MLX3 Bridge shutdown complete");
    Ok(())
}

async fn run_app(config: AppConfig, mut config_watcher: ConfigWatcher, headless: bool) -> Result<()> {
    let remote = Arc::new(ConsoleRemote::new(&config.remote));
    let peer = Arc::new(ConsolePeer::new(&config.peer));
    let log = Arc::new(TracingLog::new(config.logging.header.clone()));

    let mut gateway = Gateway::new(config, remote, peer, log);
    gateway.register_endpoints().await;
    info!("Endpoints registered, ready to bridge signals");

    // command_tx stays alive for the whole loop, so a headless run ends only on Ctrl-C
    let (command_tx, mut command_rx) = mpsc::channel::<Command>(100);
    if !headless {
        let repl_tx = command_tx.clone();
        std::thread::spawn(move || {
            if let Err(e) = cli::run_repl(repl_tx) {
                warn!("Console stopped: {:#}", e);
            }
        });
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(command) = command_rx.recv() => {
                match command {
                    Command::Event(event) => gateway.dispatch(&event),
                    Command::Status => print_status(&gateway),
                    Command::Help => println!("{}", cli::HELP),
                    Command::Quit => {
                        info!("Console closed, stopping event loop");
                        break;
                    }
                }
            }

            Some(new_config) = config_watcher.next_config() => {
                info!("📝 Configuration file changed, reloading...");
                gateway.update_config(new_config);
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    Ok(())
}

fn print_status(gateway: &Gateway) {
    let status = gateway.status();
    match serde_json::to_string_pretty(&status) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to render status: {}", e),
    }
}

async fn check_config(path: &str) -> Result<()> {
    let config = AppConfig::load(path).await?;

    println!("\n{}", "=== Configuration OK ===".bold().green());
    println!(
        "  Remote: {} @ {:#04x}",
        config.remote.name.cyan(),
        config.remote.address
    );
    println!(
        "  Peer:   {} @ {:#04x} ({}), {} boolean channels",
        config.peer.name.cyan(),
        config.peer.address,
        config.peer.host,
        config.peer.boolean_channels
    );
    println!(
        "  Buttons: identity={} overrides={} disabled={}",
        config.buttons.identity,
        config.buttons.overrides.len(),
        config.buttons.disabled.len()
    );

    let show = |channel: Option<u16>| {
        channel
            .map(|c| c.to_string().yellow().to_string())
            .unwrap_or_else(|| "off".dimmed().to_string())
    };
    println!("  Feedback:");
    println!("    volume popup: {}", show(config.feedback.volume_popup));
    println!("    mute popup:   {}", show(config.feedback.mute_popup));
    println!("    volume level: {}", show(config.feedback.volume_level));
    println!("    room label:   {}", show(config.feedback.room_label));

    Ok(())
}

fn init_logging(level: &str, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let console = if logging.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    let (file, guard) = match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mlx3-bridge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}
