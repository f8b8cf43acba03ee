//! Timer events

use chrono::{DateTime, Utc};
use mzuzu_core::models::{TimerSnapshot, TimerState, Transition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event emitted by the timer engine.
///
/// Every event carries the snapshot taken at the instant it was emitted, so a
/// consumer never has to pair it with a separately received remaining time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerEvent {
    pub event_type: TimerEventType,
    pub session_id: Uuid,
    pub snapshot: TimerSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// Types of timer events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEventType {
    /// State machine transition
    StateChanged { from: TimerState, to: TimerState },
    /// Periodic countdown update
    Tick,
    /// Time added to the current or just-completed session
    Snoozed { added_millis: i64 },
    /// User picked a new session length
    SelectedTimeChanged { selected_millis: i64 },
}

impl TimerEvent {
    /// Create a new timer event
    pub fn new(event_type: TimerEventType, session_id: Uuid, snapshot: TimerSnapshot) -> Self {
        Self {
            event_type,
            session_id,
            snapshot,
            timestamp: Utc::now(),
        }
    }

    pub fn state_changed(session_id: Uuid, transition: Transition, snapshot: TimerSnapshot) -> Self {
        Self::new(
            TimerEventType::StateChanged {
                from: transition.from,
                to: transition.to,
            },
            session_id,
            snapshot,
        )
    }

    pub fn tick(session_id: Uuid, snapshot: TimerSnapshot) -> Self {
        Self::new(TimerEventType::Tick, session_id, snapshot)
    }

    pub fn snoozed(session_id: Uuid, added_millis: i64, snapshot: TimerSnapshot) -> Self {
        Self::new(
            TimerEventType::Snoozed { added_millis },
            session_id,
            snapshot,
        )
    }

    pub fn selected_time_changed(
        session_id: Uuid,
        selected_millis: i64,
        snapshot: TimerSnapshot,
    ) -> Self {
        Self::new(
            TimerEventType::SelectedTimeChanged { selected_millis },
            session_id,
            snapshot,
        )
    }

    /// True for the event that moves a session into `Completed`.
    pub fn is_completion(&self) -> bool {
        matches!(
            self.event_type,
            TimerEventType::StateChanged {
                to: TimerState::Completed,
                ..
            }
        )
    }
}
