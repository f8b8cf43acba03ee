//! Configuration manager

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use mzuzu_core::{
    Result as CoreResult,
    models::Config,
    storage::{ConfigStorage, init_config_dir},
};

/// Config manager error
#[derive(Debug, thiserror::Error)]
pub enum ConfigManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] mzuzu_core::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigManagerError>;

/// Timer settings that can be changed at runtime. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TimerConfigUpdate {
    pub selected_duration_millis: Option<i64>,
    pub snooze_millis: Option<i64>,
    pub tick_interval_millis: Option<u64>,
    pub max_duration_minutes: Option<u64>,
}

/// Manages application configuration
pub struct ConfigManager {
    storage: ConfigStorage,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    pub fn new() -> CoreResult<Self> {
        Self::with_dir(init_config_dir()?)
    }

    pub fn with_dir(config_dir: PathBuf) -> CoreResult<Self> {
        let storage = ConfigStorage::new(config_dir);

        // Load or create default config
        let config = storage.load()?;

        Ok(Self {
            storage,
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub async fn get(&self) -> Config {
        self.config.read().await.clone()
    }

    pub async fn update(&self, config: Config) -> Result<Config> {
        let mut current = self.config.write().await;
        self.commit(&mut current, config)
    }

    pub async fn update_timer_config(&self, update: TimerConfigUpdate) -> Result<Config> {
        let mut current = self.config.write().await;
        let mut config = current.clone();

        if let Some(millis) = update.selected_duration_millis {
            config.timer.selected_duration_millis = millis;
        }

        if let Some(millis) = update.snooze_millis {
            config.timer.snooze_millis = millis;
        }

        if let Some(millis) = update.tick_interval_millis {
            config.timer.tick_interval_millis = millis;
        }

        if let Some(minutes) = update.max_duration_minutes {
            config.timer.max_duration_minutes = minutes;
        }

        self.commit(&mut current, config)
    }

    /// Remembers the session length for the next daemon start.
    pub async fn set_selected_duration(&self, millis: i64) -> Result<Config> {
        let mut current = self.config.write().await;
        if current.timer.selected_duration_millis == millis {
            return Ok(current.clone());
        }

        let mut config = current.clone();
        config.timer.selected_duration_millis = millis;
        self.commit(&mut current, config)
    }

    pub async fn reset_to_default(&self) -> Result<Config> {
        let config = Config::default();
        self.update(config).await
    }

    /// Validates and saves `config`, then replaces `current`. Callers hold
    /// the write lock for the whole read-modify-write.
    fn commit(&self, current: &mut Config, config: Config) -> Result<Config> {
        config
            .validate()
            .map_err(|e| ConfigManagerError::Invalid(e.to_string()))?;

        self.storage.save(&config)?;
        *current = config.clone();

        Ok(config)
    }
}
