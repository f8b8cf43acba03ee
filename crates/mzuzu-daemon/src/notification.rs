//! Ongoing session notification
//!
//! The updater turns every snapshot into a [`NotificationContent`] and hands
//! it to a [`NotificationSink`]. How the content is displayed is up to the
//! sink; the daemon ships one that writes it to the log.

use mzuzu_core::models::{TimerSnapshot, TimerState};
use mzuzu_core::time::remaining_minutes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::action::TimerAction;
use crate::timer::TimerEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationButton {
    pub label: String,
    pub action: TimerAction,
    /// Disabled buttons keep their slot so the layout does not jump.
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub text: String,
    pub ongoing: bool,
    pub priority: Priority,
    pub buttons: Vec<NotificationButton>,
}

impl NotificationButton {
    fn new(label: impl Into<String>, action: TimerAction) -> Self {
        Self {
            label: label.into(),
            action,
            enabled: true,
        }
    }

    fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl NotificationContent {
    pub fn for_snapshot(snapshot: &TimerSnapshot, snooze_millis: i64) -> Self {
        let minutes = remaining_minutes(snapshot.remaining_millis);
        let remaining_text = if minutes == 1 {
            "1 minute remaining".to_string()
        } else {
            format!("{} minutes remaining", minutes)
        };

        let stop = NotificationButton::new("Stop", TimerAction::Stop);
        let add = NotificationButton::new(
            format!("+{} min", remaining_minutes(snooze_millis)),
            TimerAction::Add,
        );

        match snapshot.state {
            TimerState::Running => Self {
                title: "Meditating".to_string(),
                text: remaining_text,
                ongoing: true,
                priority: Priority::Low,
                buttons: vec![stop, NotificationButton::new("Pause", TimerAction::Pause), add],
            },
            TimerState::Paused => Self {
                title: "Paused".to_string(),
                text: remaining_text,
                ongoing: false,
                priority: Priority::Low,
                buttons: vec![stop, NotificationButton::new("Play", TimerAction::Play), add],
            },
            TimerState::Stopped => Self {
                title: "Stopped".to_string(),
                text: "Start meditating?".to_string(),
                ongoing: false,
                priority: Priority::Low,
                buttons: vec![
                    stop.disabled(),
                    NotificationButton::new("Play", TimerAction::Play),
                    add.disabled(),
                ],
            },
            TimerState::Completed => Self {
                title: "Completed".to_string(),
                text: "Meditate again?".to_string(),
                ongoing: true,
                priority: Priority::Max,
                buttons: vec![
                    stop,
                    NotificationButton::new("Repeat", TimerAction::Repeat),
                    add,
                ],
            },
        }
    }

    pub fn enabled_actions(&self) -> Vec<TimerAction> {
        self.buttons
            .iter()
            .filter(|b| b.enabled)
            .map(|b| b.action)
            .collect()
    }
}

/// Displays notification content somewhere.
pub trait NotificationSink: Send + Sync {
    fn show(&self, content: &NotificationContent) -> anyhow::Result<()>;
}

pub struct LogSink;

impl NotificationSink for LogSink {
    fn show(&self, content: &NotificationContent) -> anyhow::Result<()> {
        let actions: Vec<&str> = content
            .enabled_actions()
            .iter()
            .map(TimerAction::as_str)
            .collect();

        tracing::info!(
            title = %content.title,
            text = %content.text,
            ongoing = content.ongoing,
            priority = ?content.priority,
            actions = ?actions,
            "Notification"
        );
        Ok(())
    }
}

/// Keeps the sink in step with the engine.
pub struct NotificationUpdater;

impl NotificationUpdater {
    /// Spawns the update loop. It runs until the engine is dropped. Unchanged
    /// content is not re-sent, so the sink sees at most one update per
    /// minute while a session runs.
    pub fn spawn(
        engine: &TimerEngine,
        sink: Arc<dyn NotificationSink>,
        snooze_millis: i64,
    ) -> JoinHandle<()> {
        let mut snapshots = engine.snapshot_stream();

        tokio::spawn(async move {
            let mut last: Option<NotificationContent> = None;

            while let Some(snapshot) = snapshots.next().await {
                let content = NotificationContent::for_snapshot(&snapshot, snooze_millis);
                if last.as_ref() == Some(&content) {
                    continue;
                }

                if let Err(e) = sink.show(&content) {
                    tracing::warn!("Failed to update notification: {}", e);
                }
                last = Some(content);
            }

            tracing::debug!("Notification updater finished");
        })
    }
}
