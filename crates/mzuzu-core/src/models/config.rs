//! Application configuration

use crate::time::{MILLIS_PER_MINUTE, minutes_to_millis};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    pub socket_path: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    /// Last session length chosen by the user, restored on start-up.
    pub selected_duration_millis: i64,
    /// Time added by the "add" action.
    pub snooze_millis: i64,
    pub tick_interval_millis: u64,
    /// Upper bound for a selectable session length.
    pub max_duration_minutes: u64,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.daemon.validate()?;
        self.timer.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            daemon: DaemonConfig::default(),
            timer: TimerConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Validate daemon configuration
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.trim().is_empty() {
            return Err(Error::Validation("Socket path cannot be empty".to_string()));
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/mzuzu.sock".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl TimerConfig {
    const MAX_MINUTES_LIMIT: u64 = 24 * 60;

    /// Validate timer configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_duration_minutes == 0 || self.max_duration_minutes > Self::MAX_MINUTES_LIMIT {
            return Err(Error::Validation(format!(
                "Max duration must be between 1 and {} minutes",
                Self::MAX_MINUTES_LIMIT
            )));
        }

        if self.selected_duration_millis < MILLIS_PER_MINUTE {
            return Err(Error::Validation(
                "Session length must be at least one minute".to_string(),
            ));
        }

        if self.selected_duration_millis > self.max_duration_millis() {
            return Err(Error::Validation(format!(
                "Session length too long (max {} minutes)",
                self.max_duration_minutes
            )));
        }

        if self.snooze_millis <= 0 || self.snooze_millis > self.max_duration_millis() {
            return Err(Error::Validation(
                "Snooze length must be positive and within the max duration".to_string(),
            ));
        }

        if !(100..=60_000).contains(&self.tick_interval_millis) {
            return Err(Error::Validation(
                "Tick interval must be between 100 and 60000 milliseconds".to_string(),
            ));
        }

        Ok(())
    }

    pub fn max_duration_millis(&self) -> i64 {
        minutes_to_millis(self.max_duration_minutes).unwrap_or(i64::MAX)
    }

    pub fn selected_minutes(&self) -> i64 {
        self.selected_duration_millis / MILLIS_PER_MINUTE
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            selected_duration_millis: 300_000, // 5 minutes
            snooze_millis: 120_000,            // 2 minutes
            tick_interval_millis: 1_000,
            max_duration_minutes: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.timer.selected_minutes(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_daemon_config_validation() {
        let mut config = DaemonConfig::default();
        assert!(config.validate().is_ok());

        config.socket_path = "".to_string();
        assert!(config.validate().is_err());

        config.socket_path = "/tmp/test.sock".to_string();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timer_config_invalid() {
        let mut config = TimerConfig {
            selected_duration_millis: 30_000,
            ..TimerConfig::default()
        };
        assert!(config.validate().is_err());

        config.selected_duration_millis = minutes_to_millis(121).unwrap();
        assert!(config.validate().is_err());

        config.selected_duration_millis = minutes_to_millis(120).unwrap();
        assert!(config.validate().is_ok());

        config.snooze_millis = 0;
        assert!(config.validate().is_err());

        config.snooze_millis = 60_000;
        config.tick_interval_millis = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_timer_section_uses_defaults() {
        let json = r#"{
            "version": "1.0.0",
            "daemon": { "socket_path": "/tmp/x.sock", "log_level": "debug" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.timer, TimerConfig::default());
        assert_eq!(config.daemon.log_level, "debug");
    }
}
