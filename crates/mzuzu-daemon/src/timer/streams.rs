//! Views over the engine's snapshot and event channels.
//!
//! Each stream yields the current value first, then every change. Slow
//! consumers skip intermediate values and resume at the latest one.

use mzuzu_core::models::{TimerSnapshot, TimerState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};

use super::events::{TimerEvent, TimerEventType};

/// Distinct values of one projection of the latest snapshot.
pub struct WatchStream<T> {
    rx: watch::Receiver<TimerSnapshot>,
    last: Option<T>,
    project: fn(&TimerSnapshot) -> T,
}

pub type SnapshotStream = WatchStream<TimerSnapshot>;
pub type StateStream = WatchStream<TimerState>;
pub type RemainingStream = WatchStream<i64>;

impl<T: Copy + PartialEq> WatchStream<T> {
    fn new(rx: watch::Receiver<TimerSnapshot>, project: fn(&TimerSnapshot) -> T) -> Self {
        Self {
            rx,
            last: None,
            project,
        }
    }

    /// Waits for the next distinct value. `None` once the engine is gone.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            let value = (self.project)(&self.rx.borrow_and_update());
            if self.last != Some(value) {
                self.last = Some(value);
                return Some(value);
            }
            self.rx.changed().await.ok()?;
        }
    }
}

impl SnapshotStream {
    pub fn snapshots(rx: watch::Receiver<TimerSnapshot>) -> Self {
        Self::new(rx, |snapshot| *snapshot)
    }
}

impl StateStream {
    pub fn states(rx: watch::Receiver<TimerSnapshot>) -> Self {
        Self::new(rx, |snapshot| snapshot.state)
    }
}

impl RemainingStream {
    pub fn remaining(rx: watch::Receiver<TimerSnapshot>) -> Self {
        Self::new(rx, |snapshot| snapshot.remaining_millis)
    }
}

/// What a background scheduler should do with its pending wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Replace any pending wake-up with one `remaining_millis` from now.
    Arm { remaining_millis: i64 },
    /// Cancel the pending wake-up.
    Disarm,
}

impl Schedule {
    pub fn for_snapshot(snapshot: &TimerSnapshot) -> Self {
        if snapshot.state == TimerState::Running {
            Schedule::Arm {
                remaining_millis: snapshot.remaining_millis,
            }
        } else {
            Schedule::Disarm
        }
    }

    /// Ticks never reschedule; the wake-up deadline does not move while the
    /// countdown runs normally.
    pub fn for_event(event: &TimerEvent) -> Option<Self> {
        let running = event.snapshot.state == TimerState::Running;

        match event.event_type {
            TimerEventType::StateChanged { from, to } => {
                if to == TimerState::Running {
                    Some(Self::for_snapshot(&event.snapshot))
                } else if from == TimerState::Running {
                    Some(Schedule::Disarm)
                } else {
                    None
                }
            }
            TimerEventType::Snoozed { .. } | TimerEventType::SelectedTimeChanged { .. }
                if running =>
            {
                Some(Self::for_snapshot(&event.snapshot))
            }
            _ => None,
        }
    }
}

/// State transitions paired with the remaining time at that instant, for
/// driving exact wake-ups.
pub struct TransitionStream {
    events: broadcast::Receiver<TimerEvent>,
    snapshots: watch::Receiver<TimerSnapshot>,
    primed: bool,
}

impl TransitionStream {
    pub fn new(
        events: broadcast::Receiver<TimerEvent>,
        snapshots: watch::Receiver<TimerSnapshot>,
    ) -> Self {
        Self {
            events,
            snapshots,
            primed: false,
        }
    }

    pub async fn next(&mut self) -> Option<Schedule> {
        if !self.primed {
            self.primed = true;
            return Some(Schedule::for_snapshot(&self.snapshots.borrow()));
        }

        loop {
            match self.events.recv().await {
                Ok(event) => {
                    if let Some(schedule) = Schedule::for_event(&event) {
                        return Some(schedule);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Transition stream lagged, resyncing from snapshot");
                    return Some(Schedule::for_snapshot(&self.snapshots.borrow()));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn snapshot(state: TimerState, remaining_millis: i64) -> TimerSnapshot {
        TimerSnapshot {
            state,
            remaining_millis,
        }
    }

    #[tokio::test]
    async fn test_watch_stream_replays_then_dedupes() {
        let (tx, rx) = watch::channel(snapshot(TimerState::Stopped, 300_000));
        let mut states = StateStream::states(rx);

        assert_eq!(states.next().await, Some(TimerState::Stopped));

        // Same state, different time: not a state change.
        tx.send_replace(snapshot(TimerState::Stopped, 600_000));
        tx.send_replace(snapshot(TimerState::Running, 600_000));
        assert_eq!(states.next().await, Some(TimerState::Running));

        drop(tx);
        assert_eq!(states.next().await, None);
    }

    #[tokio::test]
    async fn test_remaining_stream_sees_latest() {
        let (tx, rx) = watch::channel(snapshot(TimerState::Running, 3_000));
        let mut remaining = RemainingStream::remaining(rx);
        assert_eq!(remaining.next().await, Some(3_000));

        tx.send_replace(snapshot(TimerState::Running, 2_000));
        tx.send_replace(snapshot(TimerState::Running, 1_000));
        assert_eq!(remaining.next().await, Some(1_000));
    }

    #[test]
    fn test_schedule_for_events() {
        let id = Uuid::nil();
        let running = snapshot(TimerState::Running, 90_000);
        let paused = snapshot(TimerState::Paused, 90_000);

        let start = TimerEvent::new(
            TimerEventType::StateChanged {
                from: TimerState::Stopped,
                to: TimerState::Running,
            },
            id,
            running,
        );
        assert_eq!(
            Schedule::for_event(&start),
            Some(Schedule::Arm {
                remaining_millis: 90_000
            })
        );

        let pause = TimerEvent::new(
            TimerEventType::StateChanged {
                from: TimerState::Running,
                to: TimerState::Paused,
            },
            id,
            paused,
        );
        assert_eq!(Schedule::for_event(&pause), Some(Schedule::Disarm));

        let stop_from_pause = TimerEvent::new(
            TimerEventType::StateChanged {
                from: TimerState::Paused,
                to: TimerState::Stopped,
            },
            id,
            snapshot(TimerState::Stopped, 300_000),
        );
        assert_eq!(Schedule::for_event(&stop_from_pause), None);

        assert_eq!(
            Schedule::for_event(&TimerEvent::snoozed(id, 60_000, running)),
            Some(Schedule::Arm {
                remaining_millis: 90_000
            })
        );
        assert_eq!(
            Schedule::for_event(&TimerEvent::snoozed(id, 60_000, paused)),
            None
        );
        assert_eq!(Schedule::for_event(&TimerEvent::tick(id, running)), None);
    }

    #[tokio::test]
    async fn test_transition_stream_primes_from_snapshot() {
        let (event_tx, event_rx) = broadcast::channel(16);
        let (_snap_tx, snap_rx) = watch::channel(snapshot(TimerState::Running, 42_000));
        let mut stream = TransitionStream::new(event_rx, snap_rx);

        assert_eq!(
            stream.next().await,
            Some(Schedule::Arm {
                remaining_millis: 42_000
            })
        );

        event_tx
            .send(TimerEvent::tick(Uuid::nil(), snapshot(TimerState::Running, 41_000)))
            .unwrap();
        event_tx
            .send(TimerEvent::new(
                TimerEventType::StateChanged {
                    from: TimerState::Running,
                    to: TimerState::Stopped,
                },
                Uuid::nil(),
                snapshot(TimerState::Stopped, 300_000),
            ))
            .unwrap();
        assert_eq!(stream.next().await, Some(Schedule::Disarm));

        drop(event_tx);
        assert_eq!(stream.next().await, None);
    }
}
