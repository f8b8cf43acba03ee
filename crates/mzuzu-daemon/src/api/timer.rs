//! Timer API methods

use mzuzu_core::time::{MILLIS_PER_MINUTE, minutes_to_millis};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, Result};
use crate::action::TimerAction;
use crate::config::ConfigManager;
use crate::timer::TimerEngine;

#[derive(Debug, Default, Deserialize)]
struct SnoozeParams {
    millis: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SetDurationParams {
    millis: Option<i64>,
    minutes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ActionParams {
    action: String,
}

/// Status read after the operation, under a single engine lock.
fn status(engine: &TimerEngine) -> Result<Value> {
    Ok(serde_json::to_value(engine.status())?)
}

/// Get the current timer status
pub async fn get(engine: &TimerEngine, _params: Option<Value>) -> Result<Value> {
    status(engine)
}

/// Play, pause, resume or replay
pub async fn toggle(engine: &TimerEngine, _params: Option<Value>) -> Result<Value> {
    engine.toggle();
    status(engine)
}

pub async fn stop(engine: &TimerEngine, _params: Option<Value>) -> Result<Value> {
    engine.stop();
    status(engine)
}

/// Extend the session, by the configured snooze length unless given
pub async fn snooze(
    engine: &TimerEngine,
    config_manager: &Arc<ConfigManager>,
    params: Option<Value>,
) -> Result<Value> {
    let params: SnoozeParams = match params {
        Some(value) => serde_json::from_value(value)?,
        None => SnoozeParams::default(),
    };

    let config = config_manager.get().await;
    let millis = match params.millis {
        Some(millis) if millis <= 0 || millis > config.timer.max_duration_millis() => {
            return Err(ApiError::InvalidParams(format!(
                "Snooze length must be between 1 ms and {} minutes",
                config.timer.max_duration_minutes
            )));
        }
        Some(millis) => millis,
        None => config.timer.snooze_millis,
    };

    engine.snooze(millis);
    status(engine)
}

/// Choose the session length, as `millis` or whole `minutes`
pub async fn set_duration(
    engine: &TimerEngine,
    config_manager: &Arc<ConfigManager>,
    params: Option<Value>,
) -> Result<Value> {
    let params: SetDurationParams = serde_json::from_value(
        params.ok_or_else(|| ApiError::InvalidParams("Missing params".to_string()))?,
    )?;

    let millis = match (params.millis, params.minutes) {
        (Some(millis), None) => Some(millis),
        (None, Some(minutes)) => minutes_to_millis(minutes),
        _ => {
            return Err(ApiError::InvalidParams(
                "Expected exactly one of 'millis' or 'minutes'".to_string(),
            ));
        }
    };

    let config = config_manager.get().await;
    let millis = millis
        .filter(|millis| {
            (MILLIS_PER_MINUTE..=config.timer.max_duration_millis()).contains(millis)
        })
        .ok_or_else(|| {
            ApiError::InvalidParams(format!(
                "Session length must be between 1 and {} minutes",
                config.timer.max_duration_minutes
            ))
        })?;

    engine.set_duration(millis);
    status(engine)
}

/// Run a notification action by name
pub async fn action(
    engine: &TimerEngine,
    config_manager: &Arc<ConfigManager>,
    params: Option<Value>,
) -> Result<Value> {
    let params: ActionParams = serde_json::from_value(
        params.ok_or_else(|| ApiError::InvalidParams("Missing params".to_string()))?,
    )?;

    let action = params
        .action
        .parse::<TimerAction>()
        .map_err(|e| ApiError::InvalidParams(e.to_string()))?;

    let snooze_millis = config_manager.get().await.timer.snooze_millis;
    tracing::debug!(action = %action, "timer.action called");

    action.apply(engine, snooze_millis);
    status(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mzuzu_core::models::{TimerConfig, TimerState, TimerStatus};
    use serde_json::json;
    use tempfile::TempDir;

    fn setup(temp_dir: &TempDir) -> (TimerEngine, Arc<ConfigManager>) {
        let manager = Arc::new(ConfigManager::with_dir(temp_dir.path().to_path_buf()).unwrap());
        let engine = TimerEngine::new(&TimerConfig::default()).unwrap();
        (engine, manager)
    }

    fn parse(value: Value) -> TimerStatus {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_get_and_toggle() {
        let temp_dir = TempDir::new().unwrap();
        let (engine, _manager) = setup(&temp_dir);

        let status = parse(get(&engine, None).await.unwrap());
        assert_eq!(status.state, TimerState::Stopped);
        assert_eq!(status.remaining_display, "05:00");

        let status = parse(toggle(&engine, None).await.unwrap());
        assert_eq!(status.state, TimerState::Running);
        assert_eq!(status.session_id, engine.session_id());

        let status = parse(stop(&engine, None).await.unwrap());
        assert_eq!(status.state, TimerState::Stopped);
    }

    #[tokio::test]
    async fn test_snooze_defaults_to_config() {
        let temp_dir = TempDir::new().unwrap();
        let (engine, manager) = setup(&temp_dir);
        engine.toggle();

        let status = parse(snooze(&engine, &manager, None).await.unwrap());
        assert_eq!(status.total_millis, 420_000);

        let status = parse(
            snooze(&engine, &manager, Some(json!({"millis": 60_000})))
                .await
                .unwrap(),
        );
        assert_eq!(status.total_millis, 480_000);

        let result = snooze(&engine, &manager, Some(json!({"millis": -5}))).await;
        assert!(matches!(result, Err(ApiError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_oversized_snooze_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let (engine, manager) = setup(&temp_dir);
        engine.toggle();

        let result = snooze(&engine, &manager, Some(json!({"millis": i64::MAX}))).await;
        assert!(matches!(result, Err(ApiError::InvalidParams(_))));

        let too_long = snooze(&engine, &manager, Some(json!({"millis": 7_200_001}))).await;
        assert!(matches!(too_long, Err(ApiError::InvalidParams(_))));

        let status = parse(get(&engine, None).await.unwrap());
        assert_eq!(status.state, TimerState::Running);
        assert_eq!(status.total_millis, 300_000);

        let status = parse(
            snooze(&engine, &manager, Some(json!({"millis": 7_200_000})))
                .await
                .unwrap(),
        );
        assert_eq!(status.total_millis, 7_500_000);
    }

    #[tokio::test]
    async fn test_set_duration_bounds() {
        let temp_dir = TempDir::new().unwrap();
        let (engine, manager) = setup(&temp_dir);

        let status = parse(
            set_duration(&engine, &manager, Some(json!({"minutes": 20})))
                .await
                .unwrap(),
        );
        assert_eq!(status.selected_millis, 1_200_000);
        assert_eq!(status.remaining_millis, 1_200_000);

        let too_long = set_duration(&engine, &manager, Some(json!({"minutes": 121}))).await;
        assert!(matches!(too_long, Err(ApiError::InvalidParams(_))));

        let too_short = set_duration(&engine, &manager, Some(json!({"millis": 500}))).await;
        assert!(matches!(too_short, Err(ApiError::InvalidParams(_))));

        let both = set_duration(
            &engine,
            &manager,
            Some(json!({"millis": 60_000, "minutes": 1})),
        )
        .await;
        assert!(matches!(both, Err(ApiError::InvalidParams(_))));

        let overflowing =
            set_duration(&engine, &manager, Some(json!({"minutes": 1u64 << 62}))).await;
        assert!(matches!(overflowing, Err(ApiError::InvalidParams(_))));

        let max = set_duration(&engine, &manager, Some(json!({"minutes": u64::MAX}))).await;
        assert!(matches!(max, Err(ApiError::InvalidParams(_))));

        assert!(set_duration(&engine, &manager, None).await.is_err());
        assert_eq!(engine.selected_millis(), 1_200_000);
    }

    #[tokio::test]
    async fn test_action_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let (engine, manager) = setup(&temp_dir);

        let status = parse(
            action(&engine, &manager, Some(json!({"action": "play"})))
                .await
                .unwrap(),
        );
        assert_eq!(status.state, TimerState::Running);

        let status = parse(
            action(&engine, &manager, Some(json!({"action": "add"})))
                .await
                .unwrap(),
        );
        assert_eq!(status.total_millis, 420_000);

        let unknown = action(&engine, &manager, Some(json!({"action": "rewind"}))).await;
        assert!(matches!(unknown, Err(ApiError::InvalidParams(_))));
    }
}
