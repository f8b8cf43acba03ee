use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

use super::protocol::{JsonRpcError, Notification, Request, RequestId, Response};
use crate::api::ApiHandler;

#[derive(Debug, thiserror::Error)]
pub enum IpcServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, IpcServerError>;

type Reader = BufReader<ReadHalf<UnixStream>>;
type Writer = BufWriter<WriteHalf<UnixStream>>;

pub struct IpcServer {
    socket_path: String,
    api_handler: Arc<ApiHandler>,
}

impl IpcServer {
    pub fn new(socket_path: String, api_handler: Arc<ApiHandler>) -> Self {
        Self {
            socket_path,
            api_handler,
        }
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    pub async fn start(self: Arc<Self>) -> Result<()> {
        let path = Path::new(&self.socket_path);
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("IPC server listening on {}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        tracing::debug!("New client connected");

        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        let mut event_rx = self.api_handler.subscribe_events();

        let (notif_tx, mut notif_rx) = mpsc::channel::<Notification>(100);
        let forwarder = tokio::spawn(async move {
            loop {
                let event = match event_rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "IPC: Client fell behind on timer events");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let notification = match Notification::timer_event(&event) {
                    Ok(notification) => notification,
                    Err(e) => {
                        tracing::warn!("IPC: Failed to encode timer event: {}", e);
                        continue;
                    }
                };

                if notif_tx.send(notification).await.is_err() {
                    tracing::debug!("IPC: Event forwarder stopping, client disconnected");
                    break;
                }
            }
        });

        // Kept across select! iterations; read_line appends whatever it got
        // before being cancelled.
        let mut buf = String::new();

        loop {
            tokio::select! {
                read = Self::read_line_from(&mut reader, &mut buf) => {
                    let line = match read {
                        Ok(()) => std::mem::take(&mut buf),
                        Err(IpcServerError::Closed) => {
                            tracing::debug!("Client disconnected");
                            break;
                        }
                        Err(e) => {
                            tracing::error!("Failed to read request: {}", e);
                            break;
                        }
                    };

                    if line.trim().is_empty() {
                        continue;
                    }

                    let response = self.handle_line(&line).await;
                    if let Err(e) = Self::write_line_to(&mut writer, &response).await {
                        tracing::error!("Failed to write response: {}", e);
                        break;
                    }
                }
                Some(notification) = notif_rx.recv() => {
                    if let Err(e) = Self::write_line_to(&mut writer, &notification).await {
                        tracing::warn!("Failed to send notification: {}", e);
                        break;
                    }
                }
            }
        }

        forwarder.abort();
        Ok(())
    }

    async fn read_line_from(reader: &mut Reader, buf: &mut String) -> Result<()> {
        let bytes_read = reader.read_line(buf).await?;

        if bytes_read == 0 {
            return Err(IpcServerError::Closed);
        }

        Ok(())
    }

    async fn write_line_to<T: serde::Serialize>(writer: &mut Writer, message: &T) -> Result<()> {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// A malformed line gets an error response; the connection stays open.
    async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line.trim()) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::debug!("Unparseable request: {}", e);
                Response::error(JsonRpcError::parse_error(e.to_string()), RequestId::Null)
            }
        }
    }

    async fn handle_request(&self, request: Request) -> Response {
        if let Err(error) = request.validate() {
            return Response::error(error, request.id);
        }

        tracing::debug!("Received request: {}", request.method);

        match self
            .api_handler
            .handle(&request.method, request.params)
            .await
        {
            Ok(result) => Response::success(result, request.id),
            Err(error) => {
                tracing::debug!("Request {} failed: {}", request.method, error);
                Response::error(error.into(), request.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::timer::TimerEngine;
    use mzuzu_core::models::TimerConfig;
    use tempfile::TempDir;

    fn server(temp_dir: &TempDir) -> IpcServer {
        let socket_path = temp_dir
            .path()
            .join("test.sock")
            .to_str()
            .unwrap()
            .to_string();

        let config_manager =
            Arc::new(ConfigManager::with_dir(temp_dir.path().join("config")).unwrap());
        let engine = TimerEngine::new(&TimerConfig::default()).unwrap();
        let api_handler = Arc::new(ApiHandler::new(engine, config_manager));

        IpcServer::new(socket_path, api_handler)
    }

    #[tokio::test]
    async fn test_server_creation() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);
        assert!(server.socket_path().ends_with("test.sock"));
    }

    #[tokio::test]
    async fn test_malformed_line_gets_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);

        let response = server.handle_line("{ not json\n").await;
        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::PARSE_ERROR);
        assert_eq!(response.id, RequestId::Null);
    }

    #[tokio::test]
    async fn test_request_errors_map_to_codes() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(&temp_dir);

        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"timer.rewind","id":1}"#)
            .await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);

        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","method":"timer.set_duration","params":{"minutes":500},"id":2}"#,
            )
            .await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
        assert_eq!(response.id, RequestId::Number(2));
    }
}
