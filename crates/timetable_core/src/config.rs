//! Runtime limits for command histories and save directories.
//!
//! # Responsibility
//! - Hold tunable limits with production defaults.
//! - Validate host-supplied overrides before any history is built.
//!
//! # Invariants
//! - `max_stack_size >= 2`; smaller values would evict every pushed command.
//! - `max_save_count >= 1`; a directory always holds a current save.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MAX_STACK_SIZE: usize = 100;
pub const DEFAULT_MAX_SAVE_COUNT: usize = 10;

/// Configuration validation errors.
#[derive(Debug)]
pub enum ConfigError {
    StackTooSmall(usize),
    NoSaveSlots,
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StackTooSmall(value) => {
                write!(f, "max_stack_size must be at least 2, got {value}")
            }
            Self::NoSaveSlots => write!(f, "max_save_count must be at least 1"),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Per-history limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Stack length at which the oldest command is evicted.
    pub max_stack_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stack_size < 2 {
            return Err(ConfigError::StackTooSmall(self.max_stack_size));
        }
        Ok(())
    }
}

/// Save directory limits, including the limits of every history it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub max_save_count: usize,
    pub history: HistoryConfig,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            max_save_count: DEFAULT_MAX_SAVE_COUNT,
            history: HistoryConfig::default(),
        }
    }
}

impl DirectoryConfig {
    /// Parses a JSON override; missing fields fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_save_count == 0 {
            return Err(ConfigError::NoSaveSlots);
        }
        self.history.validate()
    }
}
