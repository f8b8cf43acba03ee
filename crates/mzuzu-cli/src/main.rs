mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mzuzu_client::MzuzuClient;
use mzuzu_core::models::TimerState;
use serde_json::json;
use std::io::Write;

fn setup_logging() -> Result<()> {
    let mut log_path = std::env::temp_dir();
    log_path.push("mzuzu-cli.log");

    let log_file = std::fs::File::create(log_path)?;
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter("mzuzu_cli=debug")
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "mzuzu")]
#[command(about = "Mzuzu - meditation timer", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "/tmp/mzuzu.sock")]
    socket: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the timer
    Status,
    /// Start, pause, resume or repeat
    Toggle,
    /// Stop and reset the session
    Stop,
    /// Add time to the session
    Snooze {
        /// Minutes to add (defaults to the configured snooze length)
        #[arg(short, long)]
        minutes: Option<u64>,
    },
    /// Choose the session length
    Set {
        /// Session length in minutes
        minutes: u64,
    },
    /// Run a notification action: play, pause, add, repeat or stop
    Action { name: String },
    /// Follow the timer until interrupted
    Watch {
        /// Ring the terminal bell when a session completes
        #[arg(short, long)]
        bell: bool,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Set the snooze length in minutes
    Snooze { minutes: u64 },
    /// Set the longest selectable session in minutes
    MaxSession { minutes: u64 },
    /// Restore defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging()?;

    tracing::debug!(command = ?args.command, socket = %args.socket, "Running command");
    let client = MzuzuClient::new(&args.socket);

    match args.command {
        Command::Status => print_status(client.timer_get().await?),
        Command::Toggle => print_status(client.timer_toggle().await?),
        Command::Stop => print_status(client.timer_stop().await?),
        Command::Snooze { minutes } => {
            let millis = minutes.map(minutes_to_millis).transpose()?;
            print_status(client.timer_snooze(millis).await?)
        }
        Command::Set { minutes } => {
            print_status(client.timer_set_duration_minutes(minutes).await?)
        }
        Command::Action { name } => print_status(client.timer_action(&name).await?),
        Command::Watch { bell } => watch(&client, bell).await?,
        Command::Config { command } => config(&client, command).await?,
    }

    Ok(())
}

fn minutes_to_millis(minutes: u64) -> Result<i64> {
    mzuzu_core::time::minutes_to_millis(minutes)
        .with_context(|| format!("{} minutes is too long", minutes))
}

fn print_status(status: mzuzu_core::models::TimerStatus) {
    println!("{}", output::status_line(&status));
}

async fn watch(client: &MzuzuClient, bell: bool) -> Result<()> {
    let mut notifications = client.subscribe_notifications().await?;

    let status = client.timer_get().await?;
    println!("{}", output::status_line(&status));
    let mut last_line = output::snapshot_line(&status.snapshot());

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    tracing::info!("Daemon closed the connection");
                    println!("Daemon disconnected");
                    break;
                };

                let Some(snapshot) = notification.timer_snapshot() else {
                    continue;
                };

                let line = output::snapshot_line(&snapshot);
                if line != last_line {
                    println!("{}", line);
                    last_line = line;
                }

                if bell
                    && snapshot.state == TimerState::Completed
                    && notification.timer_event_type() == Some("state_changed")
                {
                    print!("\x07");
                    let _ = std::io::stdout().flush();
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn config(client: &MzuzuClient, command: Option<ConfigCommand>) -> Result<()> {
    let config = match command {
        None => client.config_get().await?,
        Some(ConfigCommand::Snooze { minutes }) => {
            let snooze_millis = minutes_to_millis(minutes)?;
            client
                .config_update_timer(json!({ "snooze_millis": snooze_millis }))
                .await?
        }
        Some(ConfigCommand::MaxSession { minutes }) => {
            client
                .config_update_timer(json!({ "max_duration_minutes": minutes }))
                .await?
        }
        Some(ConfigCommand::Reset) => client.config_reset().await?,
    };

    for line in output::config_lines(&config) {
        println!("{}", line);
    }
    Ok(())
}
