//! Mzuzu daemon
//!
//! Hosts the meditation timer and serves it over a Unix socket.

use anyhow::Result;
use clap::Parser;
use mzuzu_core::storage::init_data_dir;
use mzuzu_daemon::{
    ApiHandler, ChimeTrigger, ConfigManager, DurationPersistence, IpcServer, LogChime, LogSink,
    NotificationUpdater, TimerEngine, WakeupScheduler,
};
use std::fs;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mzuzud")]
#[command(about = "Mzuzu daemon - meditation timer backend", long_about = None)]
struct Args {
    /// Socket path for IPC (defaults to the configured path)
    #[arg(short, long)]
    socket: Option<String>,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = Arc::new(ConfigManager::new()?);
    let config = config_manager.get().await;

    let socket = args.socket.unwrap_or_else(|| config.daemon.socket_path.clone());
    let log_level = args.log_level.unwrap_or_else(|| config.daemon.log_level.clone());

    // Initialize data directory and log file
    let data_dir = init_data_dir()?;
    let log_file_path = data_dir.join("daemon.log");

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    // Write to both file and stdout
    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let stdout_writer = std::io::stdout.with_max_level(tracing::Level::INFO);
    let file_writer = log_file.with_max_level(tracing::Level::DEBUG);

    tracing_subscriber::fmt()
        .with_writer(stdout_writer.and(file_writer))
        .with_env_filter(&log_level)
        .with_ansi(false) // No color codes in log file
        .init();

    tracing::info!("Mzuzu daemon starting...");
    tracing::info!("Socket path: {}", socket);
    tracing::info!("Log file: {}", log_file_path.display());

    let engine = TimerEngine::new(&config.timer)?;
    tracing::info!(
        selected_millis = engine.selected_millis(),
        "Timer engine initialized"
    );

    let collaborators = vec![
        NotificationUpdater::spawn(&engine, Arc::new(LogSink), config.timer.snooze_millis),
        ChimeTrigger::spawn(&engine, Arc::new(LogChime::default())),
        WakeupScheduler::spawn(&engine),
        DurationPersistence::spawn(&engine, config_manager.clone()),
    ];
    tracing::info!("Collaborators started");

    let api_handler = Arc::new(ApiHandler::new(engine.clone(), config_manager));
    let ipc_server = Arc::new(IpcServer::new(socket, api_handler));

    let server_handle = {
        let server = ipc_server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                tracing::error!("IPC server error: {}", e);
            }
        })
    };

    tracing::info!("Daemon ready and listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    engine.stop();
    server_handle.abort();
    for handle in collaborators {
        handle.abort();
    }

    if let Err(e) = fs::remove_file(ipc_server.socket_path()) {
        tracing::debug!("Could not remove socket: {}", e);
    }

    Ok(())
}
