//! Keeps the chosen session length in the config file

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::ConfigManager;
use crate::timer::{TimerEngine, TimerEventType};

pub struct DurationPersistence;

impl DurationPersistence {
    pub fn spawn(engine: &TimerEngine, config_manager: Arc<ConfigManager>) -> JoinHandle<()> {
        let mut events = engine.subscribe_events();

        tokio::spawn(async move {
            loop {
                let selected_millis = match events.recv().await {
                    Ok(event) => match event.event_type {
                        TimerEventType::SelectedTimeChanged { selected_millis } => selected_millis,
                        _ => continue,
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Duration persistence lagged behind");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                match config_manager.set_selected_duration(selected_millis).await {
                    Ok(_) => tracing::debug!(selected_millis, "Session length saved"),
                    Err(e) => tracing::warn!("Failed to save session length: {}", e),
                }
            }
        })
    }
}
