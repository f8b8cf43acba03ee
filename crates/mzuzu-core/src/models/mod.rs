pub mod config;
pub mod status;
pub mod timer;

pub use config::{Config, DaemonConfig, TimerConfig};
pub use status::TimerStatus;
pub use timer::{
    MeditationTimer, SnoozeOutcome, TickOutcome, TimerSnapshot, TimerState, Transition,
};
