//! Exact end-of-session wake-up
//!
//! Ticks can be starved (suspended process, overloaded runtime), so the
//! daemon also keeps one timer armed for the moment the running session is
//! due to end. When it fires the engine re-checks the wall clock and
//! completes the session if it is over.

use mzuzu_core::models::TimerState;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep};

use crate::timer::{Schedule, TimerEngine};

pub struct WakeupScheduler;

impl WakeupScheduler {
    pub fn spawn(engine: &TimerEngine) -> JoinHandle<()> {
        let mut transitions = engine.transition_stream();
        let engine = engine.clone();

        tokio::spawn(async move {
            let wakeup = sleep(Duration::ZERO);
            tokio::pin!(wakeup);
            let mut armed = false;

            loop {
                tokio::select! {
                    biased;

                    schedule = transitions.next() => match schedule {
                        Some(Schedule::Arm { remaining_millis }) => {
                            tracing::debug!(remaining_millis, "Wake-up armed");
                            wakeup.as_mut().reset(deadline(remaining_millis));
                            armed = true;
                        }
                        Some(Schedule::Disarm) => {
                            if armed {
                                tracing::debug!("Wake-up disarmed");
                            }
                            armed = false;
                        }
                        None => break,
                    },
                    () = &mut wakeup, if armed => {
                        armed = false;
                        let snapshot = engine.refresh();
                        tracing::debug!(state = %snapshot.state, "Wake-up fired");

                        // Woke early against the wall clock; try again.
                        if snapshot.state == TimerState::Running {
                            wakeup.as_mut().reset(deadline(snapshot.remaining_millis));
                            armed = true;
                        }
                    }
                }
            }
        })
    }
}

fn deadline(remaining_millis: i64) -> Instant {
    Instant::now() + Duration::from_millis(remaining_millis.max(0) as u64)
}
