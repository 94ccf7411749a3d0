use crate::domain::filter::DEFAULT_DUE_SOON_DAYS;
use crate::error::{BoardError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Longest "due soon" horizon accepted, about a century
pub const MAX_DUE_SOON_DAYS: i64 = 36_500;

/// Tunables for a board session, usually read from `taskboard.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How many days ahead the "due soon" bucket reaches
    pub due_soon_days: i64,
    /// Buffered notices per subscriber before the oldest are dropped
    pub notice_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
            notice_capacity: 64,
        }
    }
}

impl SyncConfig {
    pub const FILE_NAME: &'static str = "taskboard.toml";

    /// Parses and validates a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SyncConfig =
            toml::from_str(contents).map_err(|e| BoardError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config file at `path`, falling back to defaults when absent
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_DUE_SOON_DAYS).contains(&self.due_soon_days) {
            return Err(BoardError::ConfigError(format!(
                "due_soon_days must be between 0 and {}, got {}",
                MAX_DUE_SOON_DAYS, self.due_soon_days
            )));
        }
        if self.notice_capacity == 0 {
            return Err(BoardError::ConfigError(
                "notice_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The "due soon" horizon, clamped to the accepted range
    pub fn due_soon_window(&self) -> Duration {
        Duration::days(self.due_soon_days.clamp(0, MAX_DUE_SOON_DAYS))
    }
}
