//! Completion chime

use mzuzu_core::models::TimerState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

use crate::timer::TimerEngine;

/// Something that can play the end-of-session sound.
pub trait Chime: Send + Sync {
    /// Starts playback from the beginning.
    fn start(&self) -> anyhow::Result<()>;
    /// Pauses playback; a no-op when nothing is playing.
    fn pause(&self) -> anyhow::Result<()>;
    fn is_playing(&self) -> bool;
}

/// Logs instead of playing audio.
#[derive(Default)]
pub struct LogChime {
    playing: AtomicBool,
}

impl Chime for LogChime {
    fn start(&self) -> anyhow::Result<()> {
        self.playing.store(true, Ordering::SeqCst);
        tracing::info!("Chime started");
        Ok(())
    }

    fn pause(&self) -> anyhow::Result<()> {
        if self.playing.swap(false, Ordering::SeqCst) {
            tracing::info!("Chime paused");
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Plays the chime when a session completes and silences it on any other
/// state.
pub struct ChimeTrigger;

impl ChimeTrigger {
    pub fn spawn(engine: &TimerEngine, chime: Arc<dyn Chime>) -> JoinHandle<()> {
        let mut states = engine.state_stream();

        tokio::spawn(async move {
            while let Some(state) = states.next().await {
                let result = match state {
                    TimerState::Completed if !chime.is_playing() => chime.start(),
                    TimerState::Completed => Ok(()),
                    _ => chime.pause(),
                };

                if let Err(e) = result {
                    tracing::warn!(state = %state, "Chime failed: {}", e);
                }
            }
        })
    }
}
