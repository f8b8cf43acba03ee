//! Timer status as reported to clients

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timer::{TimerSnapshot, TimerState};
use crate::time::format_countdown;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerStatus {
    pub state: TimerState,
    pub remaining_millis: i64,
    /// `MM:SS` countdown, rounded up to the next second.
    pub remaining_display: String,
    pub selected_millis: i64,
    pub total_millis: i64,
    pub session_id: Uuid,
}

impl TimerStatus {
    pub fn new(
        snapshot: TimerSnapshot,
        selected_millis: i64,
        total_millis: i64,
        session_id: Uuid,
    ) -> Self {
        Self {
            state: snapshot.state,
            remaining_millis: snapshot.remaining_millis,
            remaining_display: format_countdown(snapshot.remaining_millis),
            selected_millis,
            total_millis,
            session_id,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            remaining_millis: self.remaining_millis,
        }
    }
}
