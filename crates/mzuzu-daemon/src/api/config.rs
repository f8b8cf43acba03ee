use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, Result};
use crate::config::ConfigManager;
use crate::config::manager::TimerConfigUpdate;
use crate::timer::TimerEngine;

#[derive(Debug, Deserialize)]
struct UpdateTimerParams {
    selected_duration_millis: Option<i64>,
    snooze_millis: Option<i64>,
    tick_interval_millis: Option<u64>,
    max_duration_minutes: Option<u64>,
}

pub async fn get(manager: &Arc<ConfigManager>, _params: Option<Value>) -> Result<Value> {
    let config = manager.get().await;
    Ok(serde_json::to_value(&config)?)
}

/// Tick interval changes apply from the next daemon start.
pub async fn update_timer(
    manager: &Arc<ConfigManager>,
    engine: &TimerEngine,
    params: Option<Value>,
) -> Result<Value> {
    let params: UpdateTimerParams = serde_json::from_value(
        params.ok_or_else(|| ApiError::InvalidParams("Missing params".to_string()))?,
    )?;

    let config = manager
        .update_timer_config(TimerConfigUpdate {
            selected_duration_millis: params.selected_duration_millis,
            snooze_millis: params.snooze_millis,
            tick_interval_millis: params.tick_interval_millis,
            max_duration_minutes: params.max_duration_minutes,
        })
        .await
        .map_err(|e| ApiError::InvalidParams(e.to_string()))?;

    if params.selected_duration_millis.is_some() {
        engine.set_duration(config.timer.selected_duration_millis);
    }

    Ok(serde_json::to_value(&config)?)
}

pub async fn reset(
    manager: &Arc<ConfigManager>,
    engine: &TimerEngine,
    _params: Option<Value>,
) -> Result<Value> {
    let config = manager
        .reset_to_default()
        .await
        .map_err(|e| ApiError::InvalidParams(e.to_string()))?;

    engine.set_duration(config.timer.selected_duration_millis);

    Ok(serde_json::to_value(&config)?)
}
