//! Pomodoro timer durations

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::store::PreferenceStore;
use crate::{Error, Result};

pub const FOCUS_TIME_KEY: &str = "focus_time";
pub const BREAK_TIME_KEY: &str = "break_time";
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Focus and break lengths, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl TimerSettings {
    /// Create settings, rejecting zero-length periods
    pub fn new(focus_minutes: u32, break_minutes: u32) -> Result<Self> {
        let settings = Self {
            focus_minutes,
            break_minutes,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject zero-length periods
    pub fn validate(&self) -> Result<()> {
        if self.focus_minutes == 0 || self.break_minutes == 0 {
            return Err(Error::InvalidInput(
                "Timer durations must be at least one minute".into(),
            ));
        }
        Ok(())
    }

    /// Read settings, using defaults for missing or unusable values
    pub async fn load(store: &dyn PreferenceStore) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            focus_minutes: read_minutes(store, FOCUS_TIME_KEY, defaults.focus_minutes).await?,
            break_minutes: read_minutes(store, BREAK_TIME_KEY, defaults.break_minutes).await?,
        })
    }

    /// Write both durations; invalid settings leave the store untouched
    pub async fn save(&self, store: &dyn PreferenceStore) -> Result<()> {
        self.validate()?;
        store.set(FOCUS_TIME_KEY, Value::from(self.focus_minutes)).await?;
        store.set(BREAK_TIME_KEY, Value::from(self.break_minutes)).await
    }
}

async fn read_minutes(store: &dyn PreferenceStore, key: &str, default: u32) -> Result<u32> {
    let Some(value) = store.get(key).await? else {
        return Ok(default);
    };
    match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
        Some(minutes) if minutes > 0 => Ok(minutes),
        _ => {
            warn!(key, value = %value, "Ignoring stored timer duration");
            Ok(default)
        }
    }
}
