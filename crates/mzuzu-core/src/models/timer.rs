use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Running,
    Paused,
    Stopped,
    Completed,
}

/// State and remaining time observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_millis: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TimerState,
    pub to: TimerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; the tick has nothing to account for.
    Idle,
    Tick { remaining_millis: i64 },
    /// The countdown reached zero and the timer moved to `Completed`.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozeOutcome {
    /// Stopped timer or non-positive extension.
    Ignored,
    /// Time added to a running or paused session.
    Extended,
    /// Time added to a completed session, which is running again.
    Resumed(Transition),
}

/// Session accounting for one meditation timer.
///
/// All times are epoch milliseconds supplied by the caller. Remaining time is
/// always derived from `now - start_timestamp` corrected by paused and added
/// time, never from a tick count, so missed ticks cannot introduce drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeditationTimer {
    state: TimerState,
    selected_millis: i64,
    added_millis: i64,
    start_timestamp: Option<i64>,
    pause_start: Option<i64>,
    accumulated_paused_millis: i64,
}

impl MeditationTimer {
    pub fn new(selected_millis: i64) -> Self {
        Self {
            state: TimerState::Stopped,
            selected_millis: selected_millis.max(0),
            added_millis: 0,
            start_timestamp: None,
            pause_start: None,
            accumulated_paused_millis: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn selected_millis(&self) -> i64 {
        self.selected_millis
    }

    pub fn added_millis(&self) -> i64 {
        self.added_millis
    }

    pub fn accumulated_paused_millis(&self) -> i64 {
        self.accumulated_paused_millis
    }

    pub fn start_timestamp(&self) -> Option<i64> {
        self.start_timestamp
    }

    pub fn pause_start(&self) -> Option<i64> {
        self.pause_start
    }

    pub fn total_millis(&self) -> i64 {
        self.selected_millis.saturating_add(self.added_millis)
    }

    pub fn remaining_millis(&self, now: i64) -> i64 {
        let Some(start) = self.start_timestamp else {
            return self.total_millis();
        };

        // While paused or completed the clock is frozen at the open pause.
        let until = self.pause_start.unwrap_or(now);
        let elapsed = until
            .saturating_sub(start)
            .saturating_sub(self.accumulated_paused_millis);

        self.total_millis().saturating_sub(elapsed)
    }

    pub fn snapshot(&self, now: i64) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            remaining_millis: self.remaining_millis(now),
        }
    }

    pub fn set_duration(&mut self, millis: i64) {
        self.selected_millis = millis.max(0);
    }

    /// Play, pause, resume or replay depending on the current state.
    pub fn toggle(&mut self, now: i64) -> Transition {
        let from = self.state;

        match from {
            TimerState::Stopped | TimerState::Completed => {
                self.reset();
                self.start_timestamp = Some(now);
                self.state = TimerState::Running;
            }
            TimerState::Running => {
                self.pause_start = Some(now);
                self.state = TimerState::Paused;
            }
            TimerState::Paused => {
                self.close_pause(now);
                self.state = TimerState::Running;
            }
        }

        Transition {
            from,
            to: self.state,
        }
    }

    pub fn stop(&mut self) -> Transition {
        let from = self.state;
        self.reset();
        self.state = TimerState::Stopped;

        Transition {
            from,
            to: self.state,
        }
    }

    pub fn snooze(&mut self, millis: i64, now: i64) -> SnoozeOutcome {
        if millis <= 0 {
            return SnoozeOutcome::Ignored;
        }

        match self.state {
            TimerState::Stopped => SnoozeOutcome::Ignored,
            TimerState::Running | TimerState::Paused => {
                self.added_millis = self.added_millis.saturating_add(millis);
                SnoozeOutcome::Extended
            }
            TimerState::Completed => {
                self.close_pause(now);
                self.added_millis = self.added_millis.saturating_add(millis);
                self.state = TimerState::Running;
                SnoozeOutcome::Resumed(Transition {
                    from: TimerState::Completed,
                    to: TimerState::Running,
                })
            }
        }
    }

    /// Re-evaluates a running session against `now`.
    pub fn tick(&mut self, now: i64) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Idle;
        }

        let remaining = self.remaining_millis(now);
        if remaining > 0 {
            return TickOutcome::Tick {
                remaining_millis: remaining,
            };
        }

        // Pin the open pause at the instant the countdown crossed zero, so the
        // completed session reads exactly 0 however late the tick arrived.
        let start = self.start_timestamp.unwrap_or(now);
        let zero_at = start
            .saturating_add(self.accumulated_paused_millis)
            .saturating_add(self.total_millis());
        self.pause_start = Some(zero_at.min(now));
        self.state = TimerState::Completed;

        TickOutcome::Completed
    }

    fn close_pause(&mut self, now: i64) {
        if let Some(pause_start) = self.pause_start.take() {
            self.accumulated_paused_millis = self
                .accumulated_paused_millis
                .saturating_add(now.saturating_sub(pause_start).max(0));
        }
    }

    fn reset(&mut self) {
        self.added_millis = 0;
        self.accumulated_paused_millis = 0;
        self.start_timestamp = None;
        self.pause_start = None;
    }
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Stopped => "stopped",
            TimerState::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
