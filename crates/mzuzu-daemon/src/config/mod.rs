//! Configuration management

pub mod manager;
pub mod persistence;

pub use manager::{ConfigManager, ConfigManagerError};
pub use persistence::DurationPersistence;
