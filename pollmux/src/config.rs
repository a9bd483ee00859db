//! Scheduler configuration and construction-time validation

use std::fs;
use std::path::Path;
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SourceId;
use crate::merge::DEFAULT_CHANNEL_CAPACITY;

/// Safety margin added on top of the stagger span when `repeat_after_ms`
/// is not supplied
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(5);

fn default_padding_ms() -> u64 {
    500
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

/// Scheduler configuration
///
/// Misconfiguration is fatal: [`validate`](PollConfig::validate) runs
/// before the pipeline starts and rejects schedules that cannot work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Ordered set of sources to poll
    pub source_ids: Vec<SourceId>,

    /// Spacing between successive stagger releases in milliseconds
    #[serde(default = "default_padding_ms")]
    pub padding_ms: u64,

    /// Steady-state polling interval per source in milliseconds
    ///
    /// When absent it is derived as `padding * source_count` plus a five
    /// second safety margin, so the steady-state cadence always clears
    /// the stagger phase.
    #[serde(default)]
    pub repeat_after_ms: Option<u64>,

    /// Capacity of the merged result channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl PollConfig {
    /// Build a config for the given sources with default timings
    pub fn new<I, S>(source_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceId>,
    {
        Self {
            source_ids: source_ids.into_iter().map(Into::into).collect(),
            padding_ms: default_padding_ms(),
            repeat_after_ms: None,
            channel_capacity: default_channel_capacity(),
        }
    }

    /// Spacing between successive stagger releases
    pub fn padding(&self) -> Duration {
        Duration::from_millis(self.padding_ms)
    }

    /// Total time the stagger phase spans for the configured set
    pub fn stagger_span(&self) -> Duration {
        self.padding() * self.source_ids.len() as u32
    }

    /// Steady-state polling interval per source
    ///
    /// Falls back to the documented derivation when not explicitly set.
    pub fn repeat_after(&self) -> Duration {
        match self.repeat_after_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.stagger_span() + DEFAULT_SAFETY_MARGIN,
        }
    }

    /// Validate the configuration before use
    ///
    /// Call this early; a rejected config must never reach the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.padding_ms == 0 {
            return Err(ConfigError::NonPositivePadding);
        }

        if let Some(ms) = self.repeat_after_ms {
            if ms == 0 {
                return Err(ConfigError::NonPositiveRepeatAfter);
            }
            let repeat_after = Duration::from_millis(ms);
            let stagger_span = self.stagger_span();
            if repeat_after <= stagger_span {
                return Err(ConfigError::RepeatAfterTooShort {
                    repeat_after,
                    stagger_span,
                });
            }
        }

        Ok(())
    }

    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config from {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!(path = %path.as_ref().display(), "Loaded poll config");
        Ok(config)
    }
}

/// Fatal configuration errors, rejected before any polling begins
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("padding must be positive")]
    NonPositivePadding,

    #[error("repeat_after must be positive")]
    NonPositiveRepeatAfter,

    #[error("repeat_after {repeat_after:?} must exceed the stagger span {stagger_span:?}")]
    RepeatAfterTooShort {
        repeat_after: Duration,
        stagger_span: Duration,
    },
}
