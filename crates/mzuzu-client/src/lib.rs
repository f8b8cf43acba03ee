//! Mzuzu Client Library
//!
//! Provides a client for communicating with the Mzuzu daemon via Unix sockets.

use anyhow::Result;
use mzuzu_core::models::{Config, TimerSnapshot, TimerStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::UnixStream;
use tokio::sync::{Mutex, RwLock, mpsc};

/// Method name of the notifications carrying engine events.
pub const TIMER_EVENT_METHOD: &str = "timer.event";

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    jsonrpc: String,
    pub method: String,
    pub params: Option<Value>,
    pub id: RequestId,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    pub id: RequestId,
}

/// JSON-RPC 2.0 Error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 Notification (no id field)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// Request ID (can be string, number, or null)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

impl Response {
    fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            anyhow::bail!("RPC error {}: {}", error.code, error.message);
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

impl Notification {
    pub fn is_timer_event(&self) -> bool {
        self.method == TIMER_EVENT_METHOD
    }

    /// Snapshot carried by a timer event, if this is one.
    pub fn timer_snapshot(&self) -> Option<TimerSnapshot> {
        if !self.is_timer_event() {
            return None;
        }
        serde_json::from_value(self.params.get("snapshot")?.clone()).ok()
    }

    /// Event kind of a timer event, e.g. `tick` or `state_changed`.
    pub fn timer_event_type(&self) -> Option<&str> {
        if !self.is_timer_event() {
            return None;
        }
        self.params.get("event_type")?.get("type")?.as_str()
    }
}

type PendingResponses = Arc<RwLock<HashMap<i64, mpsc::Sender<Response>>>>;

/// Persistent connection state
struct PersistentConnection {
    writer: Arc<Mutex<BufWriter<tokio::io::WriteHalf<UnixStream>>>>,
    pending_responses: PendingResponses,
}

/// Mzuzu daemon client
pub struct MzuzuClient {
    socket_path: String,
    request_counter: AtomicI64,
    persistent_conn: Arc<Mutex<Option<PersistentConnection>>>,
}

impl MzuzuClient {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            request_counter: AtomicI64::new(1),
            persistent_conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Opens a persistent connection and returns the daemon's push
    /// notifications. Later calls share the connection.
    pub async fn subscribe_notifications(&self) -> Result<mpsc::Receiver<Notification>> {
        let mut conn_lock = self.persistent_conn.lock().await;

        if conn_lock.is_some() {
            anyhow::bail!("Already subscribed to notifications");
        }

        let stream = self.connect().await?;
        let (read_half, write_half) = tokio::io::split(stream);
        let writer = Arc::new(Mutex::new(BufWriter::new(write_half)));

        let (notif_tx, notif_rx) = mpsc::channel::<Notification>(100);
        let pending_responses: PendingResponses = Arc::new(RwLock::new(HashMap::new()));

        let pending = pending_responses.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        // Notifications have a method and no id
                        if let Ok(notification) = serde_json::from_str::<Notification>(&line) {
                            let _ = notif_tx.send(notification).await;
                        } else if let Ok(response) = serde_json::from_str::<Response>(&line)
                            && let RequestId::Number(id) = response.id
                        {
                            let pending = pending.read().await;
                            if let Some(tx) = pending.get(&id) {
                                let _ = tx.send(response).await;
                            }
                        }
                    }
                }
            }

            // Wake up callers still waiting on this connection.
            pending.write().await.clear();
        });

        *conn_lock = Some(PersistentConnection {
            writer,
            pending_responses,
        });

        Ok(notif_rx)
    }

    /// Send a request using the persistent connection (if available)
    async fn call_persistent(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Result<Value> {
        let conn_lock = self.persistent_conn.lock().await;

        let Some(conn) = conn_lock.as_ref() else {
            drop(conn_lock);
            return self.call_oneshot(method, params).await;
        };

        let request_id = self.next_id();
        let request = Request::new(method, params, RequestId::Number(request_id));

        let (tx, mut rx) = mpsc::channel::<Response>(1);
        conn.pending_responses.write().await.insert(request_id, tx);

        {
            let mut writer = conn.writer.lock().await;
            let request_json = serde_json::to_string(&request)?;
            writer.write_all(request_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        let response = rx.recv().await;
        conn.pending_responses.write().await.remove(&request_id);

        response
            .ok_or_else(|| anyhow::anyhow!("Connection closed before response"))?
            .into_result()
    }

    /// Send a one-shot request (creates new connection)
    async fn call_oneshot(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        let mut stream = self.connect().await?;
        let request = Request::new(method, params, RequestId::Number(self.next_id()));

        let request_json = serde_json::to_string(&request)?;
        stream.write_all(request_json.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        // Events pushed before the response are skipped.
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                anyhow::bail!("Connection closed before response");
            }

            if let Ok(response) = serde_json::from_str::<Response>(&line) {
                return response.into_result();
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        Ok(UnixStream::connect(&self.socket_path).await?)
    }

    fn next_id(&self) -> i64 {
        self.request_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Send a request and receive a response
    /// If persistent connection is active, uses it; otherwise creates one-shot connection
    pub async fn call(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        self.call_persistent(method, params).await
    }

    async fn call_status(&self, method: &str, params: Option<Value>) -> Result<TimerStatus> {
        let value = self.call(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    // Timer methods

    pub async fn timer_get(&self) -> Result<TimerStatus> {
        self.call_status("timer.get", None).await
    }

    /// Play, pause, resume or replay
    pub async fn timer_toggle(&self) -> Result<TimerStatus> {
        self.call_status("timer.toggle", None).await
    }

    pub async fn timer_stop(&self) -> Result<TimerStatus> {
        self.call_status("timer.stop", None).await
    }

    /// Extend the session; `None` uses the daemon's configured snooze length
    pub async fn timer_snooze(&self, millis: Option<i64>) -> Result<TimerStatus> {
        let params = millis.map(|millis| json!({ "millis": millis }));
        self.call_status("timer.snooze", params).await
    }

    pub async fn timer_set_duration_minutes(&self, minutes: u64) -> Result<TimerStatus> {
        self.call_status("timer.set_duration", Some(json!({ "minutes": minutes })))
            .await
    }

    pub async fn timer_set_duration_millis(&self, millis: i64) -> Result<TimerStatus> {
        self.call_status("timer.set_duration", Some(json!({ "millis": millis })))
            .await
    }

    /// Run a notification action (`play`, `pause`, `add`, `repeat`, `stop`)
    pub async fn timer_action(&self, action: &str) -> Result<TimerStatus> {
        self.call_status("timer.action", Some(json!({ "action": action })))
            .await
    }

    // Config methods

    pub async fn config_get(&self) -> Result<Config> {
        let value = self.call("config.get", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Update timer settings; omitted fields keep their value
    pub async fn config_update_timer(&self, params: Value) -> Result<Config> {
        let value = self.call("config.update_timer", Some(params)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn config_reset(&self) -> Result<Config> {
        let value = self.call("config.reset", None).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = MzuzuClient::new("/tmp/test.sock");
        assert_eq!(client.socket_path, "/tmp/test.sock");
        assert_eq!(client.next_id(), 1);
        assert_eq!(client.next_id(), 2);
    }

    #[test]
    fn test_error_response_becomes_err() {
        let line = r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params: too long"},"id":3}"#;
        let response: Response = serde_json::from_str(line).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("-32602"));
    }

    #[test]
    fn test_notification_is_not_a_response() {
        let line = r#"{"jsonrpc":"2.0","method":"timer.event","params":{"event_type":{"type":"tick"},"snapshot":{"state":"running","remaining_millis":59000}}}"#;
        let notification: Notification = serde_json::from_str(line).unwrap();

        assert_eq!(notification.timer_event_type(), Some("tick"));
        let snapshot = notification.timer_snapshot().unwrap();
        assert_eq!(snapshot.remaining_millis, 59_000);

        let response = r#"{"jsonrpc":"2.0","result":{"state":"running"},"id":1}"#;
        assert!(serde_json::from_str::<Notification>(response).is_err());
    }

    #[tokio::test]
    async fn test_call_without_daemon_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let client = MzuzuClient::new(dir.path().join("missing.sock").to_string_lossy());
        assert!(client.timer_get().await.is_err());
    }
}
