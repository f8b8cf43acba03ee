//! API handlers

pub mod config;
pub mod timer;

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ConfigManager;
use crate::timer::{TimerEngine, TimerEvent};

/// API error
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Routes requests to the timer engine and the config manager
pub struct ApiHandler {
    engine: TimerEngine,
    config_manager: Arc<ConfigManager>,
}

impl ApiHandler {
    pub fn new(engine: TimerEngine, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            engine,
            config_manager,
        }
    }

    pub async fn handle(&self, method: &str, params: Option<Value>) -> Result<Value> {
        match method {
            // Timer methods
            "timer.get" => timer::get(&self.engine, params).await,
            "timer.toggle" => timer::toggle(&self.engine, params).await,
            "timer.stop" => timer::stop(&self.engine, params).await,
            "timer.snooze" => timer::snooze(&self.engine, &self.config_manager, params).await,
            "timer.set_duration" => {
                timer::set_duration(&self.engine, &self.config_manager, params).await
            }
            "timer.action" => timer::action(&self.engine, &self.config_manager, params).await,

            // Config methods
            "config.get" => config::get(&self.config_manager, params).await,
            "config.update_timer" => {
                config::update_timer(&self.config_manager, &self.engine, params).await
            }
            "config.reset" => config::reset(&self.config_manager, &self.engine, params).await,

            // Unknown method
            _ => Err(ApiError::MethodNotFound(method.to_string())),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.engine.subscribe_events()
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }
}
