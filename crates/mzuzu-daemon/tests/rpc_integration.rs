use anyhow::Result;
use mzuzu_client::MzuzuClient;
use mzuzu_core::models::{TimerConfig, TimerState};
use mzuzu_daemon::{ApiHandler, ConfigManager, DurationPersistence, IpcServer, TimerEngine};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

struct TestDaemon {
    socket: String,
    config_manager: Arc<ConfigManager>,
    server: JoinHandle<()>,
    persistence: JoinHandle<()>,
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.server.abort();
        self.persistence.abort();
    }
}

async fn start_daemon(temp_dir: &TempDir) -> Result<TestDaemon> {
    let socket_path = temp_dir.path().join("mzuzu_test.sock");
    let socket = socket_path.to_string_lossy().to_string();

    let config_manager = Arc::new(ConfigManager::with_dir(temp_dir.path().join("config"))?);
    let engine = TimerEngine::new(&TimerConfig::default())?;
    let persistence = DurationPersistence::spawn(&engine, config_manager.clone());

    let api_handler = Arc::new(ApiHandler::new(engine, config_manager.clone()));
    let ipc_server = Arc::new(IpcServer::new(socket.clone(), api_handler));

    let server = tokio::spawn(async move {
        ipc_server.start().await.unwrap();
    });

    wait_for_socket(&socket_path).await;

    Ok(TestDaemon {
        socket,
        config_manager,
        server,
        persistence,
    })
}

async fn wait_for_socket(path: &Path) {
    let mut retries = 0;
    while !path.exists() && retries < 50 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        retries += 1;
    }
    if !path.exists() {
        panic!("Socket was not created");
    }
}

#[tokio::test]
async fn test_rpc_timer_lifecycle() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let daemon = start_daemon(&temp_dir).await?;
    let client = MzuzuClient::new(&daemon.socket);

    let status = client.timer_get().await?;
    assert_eq!(status.state, TimerState::Stopped);
    assert_eq!(status.remaining_millis, 300_000);

    let status = client.timer_toggle().await?;
    assert_eq!(status.state, TimerState::Running);
    let session_id = status.session_id;

    let status = client.timer_snooze(None).await?;
    assert_eq!(status.total_millis, 420_000);
    assert_eq!(status.session_id, session_id);

    let status = client.timer_action("pause").await?;
    assert_eq!(status.state, TimerState::Paused);

    // Stale action from an old notification
    let status = client.timer_action("pause").await?;
    assert_eq!(status.state, TimerState::Paused);

    let status = client.timer_action("play").await?;
    assert_eq!(status.state, TimerState::Running);

    let status = client.timer_stop().await?;
    assert_eq!(status.state, TimerState::Stopped);
    assert_eq!(status.total_millis, 300_000);
    assert_eq!(status.remaining_millis, 300_000);

    Ok(())
}

#[tokio::test]
async fn test_rpc_errors() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let daemon = start_daemon(&temp_dir).await?;
    let client = MzuzuClient::new(&daemon.socket);

    let err = client.timer_set_duration_minutes(500).await.unwrap_err();
    assert!(err.to_string().contains("-32602"));

    let err = client.timer_action("rewind").await.unwrap_err();
    assert!(err.to_string().contains("-32602"));

    let err = client.call("timer.rewind", None).await.unwrap_err();
    assert!(err.to_string().contains("-32601"));

    // Errors leave the timer untouched
    let status = client.timer_get().await?;
    assert_eq!(status.state, TimerState::Stopped);
    assert_eq!(status.selected_millis, 300_000);

    Ok(())
}

#[tokio::test]
async fn test_rpc_selected_duration_is_persisted() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let daemon = start_daemon(&temp_dir).await?;
    let client = MzuzuClient::new(&daemon.socket);

    let status = client.timer_set_duration_minutes(20).await?;
    assert_eq!(status.selected_millis, 1_200_000);

    let mut retries = 0;
    while daemon.config_manager.get().await.timer.selected_duration_millis != 1_200_000
        && retries < 50
    {
        tokio::time::sleep(Duration::from_millis(20)).await;
        retries += 1;
    }

    let reloaded = ConfigManager::with_dir(temp_dir.path().join("config"))?;
    assert_eq!(
        reloaded.get().await.timer.selected_duration_millis,
        1_200_000
    );

    Ok(())
}

#[tokio::test]
async fn test_rpc_config_update_and_reset() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let daemon = start_daemon(&temp_dir).await?;
    let client = MzuzuClient::new(&daemon.socket);

    let config = client
        .config_update_timer(json!({ "snooze_millis": 180_000 }))
        .await?;
    assert_eq!(config.timer.snooze_millis, 180_000);

    client.timer_toggle().await?;
    let status = client.timer_snooze(None).await?;
    assert_eq!(status.total_millis, 480_000);

    let config = client.config_reset().await?;
    assert_eq!(config.timer.snooze_millis, 120_000);

    let config = client.config_get().await?;
    assert_eq!(config.timer.snooze_millis, 120_000);

    Ok(())
}

#[tokio::test]
async fn test_rpc_pushes_timer_events() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let daemon = start_daemon(&temp_dir).await?;
    let client = MzuzuClient::new(&daemon.socket);

    let mut notifications = client.subscribe_notifications().await?;

    // Goes over the subscribed connection
    let status = client.timer_toggle().await?;
    assert_eq!(status.state, TimerState::Running);

    let notification = tokio::time::timeout(Duration::from_secs(2), notifications.recv())
        .await?
        .expect("notification channel closed");

    assert!(notification.is_timer_event());
    assert_eq!(notification.timer_event_type(), Some("state_changed"));
    let snapshot = notification.timer_snapshot().unwrap();
    assert_eq!(snapshot.state, TimerState::Running);

    client.timer_stop().await?;
    Ok(())
}
