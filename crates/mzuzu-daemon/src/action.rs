//! Notification button actions

use mzuzu_core::models::{TimerSnapshot, TimerState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::timer::TimerEngine;

#[derive(Debug, thiserror::Error)]
#[error("Unknown timer action: {0}")]
pub struct ParseActionError(String);

/// A control request raised from outside the daemon, usually by a
/// notification button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Play,
    Pause,
    Add,
    Repeat,
    Stop,
}

impl TimerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerAction::Play => "play",
            TimerAction::Pause => "pause",
            TimerAction::Add => "add",
            TimerAction::Repeat => "repeat",
            TimerAction::Stop => "stop",
        }
    }

    /// Whether toggling from `state` performs this action.
    fn toggles_from(&self, state: TimerState) -> bool {
        match self {
            TimerAction::Play => matches!(state, TimerState::Stopped | TimerState::Paused),
            TimerAction::Pause => state == TimerState::Running,
            TimerAction::Repeat => state == TimerState::Completed,
            TimerAction::Add | TimerAction::Stop => false,
        }
    }

    /// Dispatches the action to the engine. An action that no longer matches
    /// the engine state leaves it untouched.
    pub fn apply(&self, engine: &TimerEngine, snooze_millis: i64) -> TimerSnapshot {
        match self {
            TimerAction::Add => engine.snooze(snooze_millis),
            TimerAction::Stop => engine.stop(),
            TimerAction::Play | TimerAction::Pause | TimerAction::Repeat => engine
                .toggle_if(|state| self.toggles_from(state))
                .unwrap_or_else(|| {
                    let snapshot = engine.snapshot();
                    tracing::debug!(action = %self, state = %snapshot.state, "Ignoring stale action");
                    snapshot
                }),
        }
    }
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(TimerAction::Play),
            "pause" => Ok(TimerAction::Pause),
            "add" => Ok(TimerAction::Add),
            "repeat" => Ok(TimerAction::Repeat),
            "stop" => Ok(TimerAction::Stop),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}
