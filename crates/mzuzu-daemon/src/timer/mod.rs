pub mod engine;
pub mod events;
pub mod streams;


pub use engine::{TimerEngine, TimerEngineError};
pub use events::{TimerEvent, TimerEventType};
pub use streams::{RemainingStream, Schedule, SnapshotStream, StateStream, TransitionStream};
