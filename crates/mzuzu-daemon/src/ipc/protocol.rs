//! JSON-RPC 2.0 messages, one per line on the socket.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;
use crate::timer::TimerEvent;

pub const JSONRPC_VERSION: &str = "2.0";

/// Method name of the notification pushed for every engine event.
pub const TIMER_EVENT_METHOD: &str = "timer.event";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Value>,
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: message.into(),
            data: None,
        }
    }
}

impl From<ApiError> for JsonRpcError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::MethodNotFound(method) => Self::method_not_found(&method),
            ApiError::InvalidParams(_) | ApiError::Json(_) => {
                Self::invalid_params(error.to_string())
            }
        }
    }
}

impl Request {
    pub fn new(method: String, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params,
            id,
        }
    }

    pub fn validate(&self) -> Result<(), JsonRpcError> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::invalid_request("Invalid JSON-RPC version"));
        }
        Ok(())
    }
}

impl Response {
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(error: JsonRpcError, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

impl Notification {
    pub fn new(method: String, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params,
        }
    }

    pub fn timer_event(event: &TimerEvent) -> serde_json::Result<Self> {
        Ok(Self::new(
            TIMER_EVENT_METHOD.to_string(),
            serde_json::to_value(event)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mzuzu_core::models::{TimerSnapshot, TimerState};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_request_serialization() {
        let req = Request::new(
            "timer.snooze".to_string(),
            Some(json!({"millis": 120_000})),
            RequestId::Number(1),
        );

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"method\":\"timer.snooze\""));
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_wrong_version_is_invalid() {
        let req: Request =
            serde_json::from_str(r#"{"jsonrpc":"1.0","method":"timer.get","id":"a"}"#).unwrap();
        let error = req.validate().unwrap_err();
        assert_eq!(error.code, JsonRpcError::INVALID_REQUEST);
        assert_eq!(req.id, RequestId::String("a".to_string()));
    }

    #[test]
    fn test_response_shapes() {
        let ok = Response::success(json!({"state": "running"}), RequestId::Number(1));
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["result"]["state"], "running");

        let err = Response::error(JsonRpcError::method_not_found("timer.rewind"), RequestId::Null);
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32601);
        assert!(json["id"].is_null());
    }

    #[test]
    fn test_api_error_codes() {
        let not_found: JsonRpcError = ApiError::MethodNotFound("x".to_string()).into();
        assert_eq!(not_found.code, JsonRpcError::METHOD_NOT_FOUND);

        let invalid: JsonRpcError = ApiError::InvalidParams("too long".to_string()).into();
        assert_eq!(invalid.code, JsonRpcError::INVALID_PARAMS);
        assert!(invalid.message.contains("too long"));
    }

    #[test]
    fn test_timer_event_notification() {
        let event = TimerEvent::tick(
            Uuid::nil(),
            TimerSnapshot {
                state: TimerState::Running,
                remaining_millis: 59_000,
            },
        );

        let notif = Notification::timer_event(&event).unwrap();
        assert_eq!(notif.method, TIMER_EVENT_METHOD);
        assert_eq!(notif.params["event_type"]["type"], "tick");
        assert_eq!(notif.params["snapshot"]["remaining_millis"], 59_000);
    }
}
