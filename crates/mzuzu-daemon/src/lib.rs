//! Mzuzu daemon library
//!
//! Core daemon functionality exposed as a library for testing.

pub mod action;
pub mod api;
pub mod chime;
pub mod config;
pub mod ipc;
pub mod notification;
pub mod scheduler;
pub mod timer;

pub use action::TimerAction;
pub use api::ApiHandler;
pub use chime::{Chime, ChimeTrigger, LogChime};
pub use config::{ConfigManager, DurationPersistence};
pub use ipc::{IpcServer, Notification, Request, Response};
pub use notification::{LogSink, NotificationContent, NotificationSink, NotificationUpdater};
pub use scheduler::WakeupScheduler;
pub use timer::{TimerEngine, TimerEvent, TimerEventType};
