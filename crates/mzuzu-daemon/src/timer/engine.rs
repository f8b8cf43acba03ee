use mzuzu_core::models::{
    MeditationTimer, SnoozeOutcome, TickOutcome, TimerConfig, TimerSnapshot, TimerState,
    TimerStatus, Transition,
};
use mzuzu_core::{Clock, SystemClock};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use uuid::Uuid;

use super::events::TimerEvent;
use super::streams::{RemainingStream, SnapshotStream, StateStream, TransitionStream};

#[derive(Debug, thiserror::Error)]
pub enum TimerEngineError {
    #[error("Timer engine must be created inside a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Invalid tick interval: {0}ms")]
    InvalidTickInterval(u64),
}

pub type Result<T> = std::result::Result<T, TimerEngineError>;

/// The process-wide meditation timer.
///
/// Control operations are synchronous and total. Every state change is
/// published while the engine lock is held: first the snapshot channel, then
/// the event channel, so observers see state and remaining time that belong
/// to the same instant. Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct TimerEngine {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    event_tx: broadcast::Sender<TimerEvent>,
    tick_interval: Duration,
    runtime: Handle,
}

struct Inner {
    timer: MeditationTimer,
    session_id: Uuid,
    tick_task: Option<JoinHandle<()>>,
    /// Bumped whenever the tick source is cancelled; a tick carrying an older
    /// generation is discarded.
    tick_generation: u64,
}

impl TimerEngine {
    pub fn new(config: &TimerConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &TimerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.tick_interval_millis == 0 {
            return Err(TimerEngineError::InvalidTickInterval(
                config.tick_interval_millis,
            ));
        }

        let runtime = Handle::try_current()?;
        let timer = MeditationTimer::new(config.selected_duration_millis);
        let (snapshot_tx, _) = watch::channel(timer.snapshot(clock.now_millis()));
        let (event_tx, _) = broadcast::channel(1000);

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    timer,
                    session_id: Uuid::new_v4(),
                    tick_task: None,
                    tick_generation: 0,
                }),
                clock,
                snapshot_tx,
                event_tx,
                tick_interval: Duration::from_millis(config.tick_interval_millis),
                runtime,
            }),
        })
    }

    // ── Control ──────────────────────────────────────────────────────

    pub fn set_duration(&self, millis: i64) -> TimerSnapshot {
        let mut inner = self.lock();
        let now = self.now();

        inner.timer.set_duration(millis);
        let selected = inner.timer.selected_millis();
        tracing::info!(selected_millis = selected, "Session length changed");

        self.publish(&inner, now, |session_id, snapshot| {
            vec![TimerEvent::selected_time_changed(
                session_id, selected, snapshot,
            )]
        })
    }

    /// Play, pause, resume or replay.
    pub fn toggle(&self) -> TimerSnapshot {
        let mut inner = self.lock();
        self.toggle_locked(&mut inner)
    }

    /// Toggles only if `allowed` accepts the state found under the same lock.
    /// Returns `None` and changes nothing otherwise.
    pub fn toggle_if<F>(&self, allowed: F) -> Option<TimerSnapshot>
    where
        F: FnOnce(TimerState) -> bool,
    {
        let mut inner = self.lock();
        if !allowed(inner.timer.state()) {
            return None;
        }
        Some(self.toggle_locked(&mut inner))
    }

    fn toggle_locked(&self, inner: &mut Inner) -> TimerSnapshot {
        let now = self.now();

        let transition = inner.timer.toggle(now);
        if matches!(
            transition.from,
            TimerState::Stopped | TimerState::Completed
        ) {
            inner.session_id = Uuid::new_v4();
        }

        if transition.to == TimerState::Running {
            self.start_ticking(inner);
        } else {
            self.cancel_ticking(inner);
        }

        tracing::info!(
            from = %transition.from,
            to = %transition.to,
            session_id = %inner.session_id,
            "Timer toggled"
        );

        self.publish(inner, now, |session_id, snapshot| {
            vec![TimerEvent::state_changed(session_id, transition, snapshot)]
        })
    }

    pub fn stop(&self) -> TimerSnapshot {
        let mut inner = self.lock();
        let now = self.now();

        self.cancel_ticking(&mut inner);
        let transition = inner.timer.stop();

        if transition.from == TimerState::Stopped {
            tracing::debug!("Stop requested while already stopped");
            return inner.timer.snapshot(now);
        }

        tracing::info!(from = %transition.from, session_id = %inner.session_id, "Timer stopped");

        self.publish(&inner, now, |session_id, snapshot| {
            vec![TimerEvent::state_changed(session_id, transition, snapshot)]
        })
    }

    /// Extends the session. Ignored while stopped.
    pub fn snooze(&self, millis: i64) -> TimerSnapshot {
        let mut inner = self.lock();
        let now = self.now();

        match inner.timer.snooze(millis, now) {
            SnoozeOutcome::Ignored => {
                tracing::debug!(millis, state = %inner.timer.state(), "Snooze ignored");
                inner.timer.snapshot(now)
            }
            SnoozeOutcome::Extended => {
                tracing::info!(millis, session_id = %inner.session_id, "Session snoozed");
                self.publish(&inner, now, |session_id, snapshot| {
                    vec![TimerEvent::snoozed(session_id, millis, snapshot)]
                })
            }
            SnoozeOutcome::Resumed(transition) => {
                self.start_ticking(&mut inner);
                tracing::info!(
                    millis,
                    session_id = %inner.session_id,
                    "Completed session snoozed, running again"
                );
                self.publish(&inner, now, |session_id, snapshot| {
                    vec![
                        TimerEvent::state_changed(session_id, transition, snapshot),
                        TimerEvent::snoozed(session_id, millis, snapshot),
                    ]
                })
            }
        }
    }

    /// Re-evaluates a running session against the clock right now, exactly
    /// like a tick would. Used by wake-ups that may arrive while ticks starve.
    pub fn refresh(&self) -> TimerSnapshot {
        let mut inner = self.lock();
        let now = self.now();
        let (_, snapshot) = self.evaluate(&mut inner, now);
        snapshot
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Snapshot, lengths and session id read under one lock.
    pub fn status(&self) -> TimerStatus {
        let inner = self.lock();
        TimerStatus::new(
            inner.timer.snapshot(self.now()),
            inner.timer.selected_millis(),
            inner.timer.total_millis(),
            inner.session_id,
        )
    }

    pub fn state(&self) -> TimerState {
        self.lock().timer.state()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let inner = self.lock();
        inner.timer.snapshot(self.now())
    }

    pub fn remaining_millis(&self) -> i64 {
        let inner = self.lock();
        inner.timer.remaining_millis(self.now())
    }

    pub fn total_millis(&self) -> i64 {
        self.lock().timer.total_millis()
    }

    pub fn selected_millis(&self) -> i64 {
        self.lock().timer.selected_millis()
    }

    pub fn session_id(&self) -> Uuid {
        self.lock().session_id
    }

    pub fn is_ticking(&self) -> bool {
        self.lock().tick_task.is_some()
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Latest snapshot, replayed to new subscribers.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn snapshot_stream(&self) -> SnapshotStream {
        SnapshotStream::snapshots(self.subscribe_snapshots())
    }

    pub fn state_stream(&self) -> StateStream {
        StateStream::states(self.subscribe_snapshots())
    }

    pub fn remaining_stream(&self) -> RemainingStream {
        RemainingStream::remaining(self.subscribe_snapshots())
    }

    pub fn transition_stream(&self) -> TransitionStream {
        // Events first, so nothing emitted after the snapshot read is lost.
        let events = self.subscribe_events();
        TransitionStream::new(events, self.subscribe_snapshots())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> i64 {
        self.shared.clock.now_millis()
    }

    fn publish<F>(&self, inner: &Inner, now: i64, events: F) -> TimerSnapshot
    where
        F: FnOnce(Uuid, TimerSnapshot) -> Vec<TimerEvent>,
    {
        let snapshot = inner.timer.snapshot(now);
        self.shared.snapshot_tx.send_replace(snapshot);

        for event in events(inner.session_id, snapshot) {
            // No receivers is fine; the snapshot channel still holds the state.
            let _ = self.shared.event_tx.send(event);
        }

        snapshot
    }

    fn evaluate(&self, inner: &mut Inner, now: i64) -> (TickOutcome, TimerSnapshot) {
        let outcome = inner.timer.tick(now);

        let snapshot = match outcome {
            TickOutcome::Idle => inner.timer.snapshot(now),
            TickOutcome::Tick { remaining_millis } => {
                tracing::debug!(remaining_millis, "Tick");
                self.publish(inner, now, |session_id, snapshot| {
                    vec![TimerEvent::tick(session_id, snapshot)]
                })
            }
            TickOutcome::Completed => {
                self.cancel_ticking(inner);
                tracing::info!(session_id = %inner.session_id, "Session completed");
                let transition = Transition {
                    from: TimerState::Running,
                    to: TimerState::Completed,
                };
                self.publish(inner, now, |session_id, snapshot| {
                    vec![TimerEvent::state_changed(session_id, transition, snapshot)]
                })
            }
        };

        (outcome, snapshot)
    }

    /// Handles one tick of the task spawned for `generation`. Returns false
    /// once that task should exit.
    pub(crate) fn on_tick(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.tick_generation != generation {
            return false;
        }

        let now = self.now();
        let (outcome, _) = self.evaluate(&mut inner, now);
        matches!(outcome, TickOutcome::Tick { .. })
    }

    pub(crate) fn tick_generation(&self) -> u64 {
        self.lock().tick_generation
    }

    fn start_ticking(&self, inner: &mut Inner) {
        self.cancel_ticking(inner);

        let generation = inner.tick_generation;
        let period = self.shared.tick_interval;
        let shared = Arc::downgrade(&self.shared);
        let first_tick = Instant::now() + period;

        let task = self.shared.runtime.spawn(async move {
            let mut ticks = interval_at(first_tick, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticks.tick().await;

                let Some(shared) = shared.upgrade() else {
                    break;
                };
                if !(TimerEngine { shared }).on_tick(generation) {
                    break;
                }
            }
        });

        inner.tick_task = Some(task);
    }

    fn cancel_ticking(&self, inner: &mut Inner) {
        inner.tick_generation = inner.tick_generation.wrapping_add(1);
        if let Some(task) = inner.tick_task.take() {
            task.abort();
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = inner.tick_task.take() {
            task.abort();
        }
    }
}
