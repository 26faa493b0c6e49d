//! Autosave engine configuration.
//!
//! # Responsibility
//! - Hold debounce, quiet-period and settle windows used by the engine.
//! - Load overrides from JSON and reject out-of-range values.
//!
//! # Invariants
//! - Missing fields fall back to defaults; unknown fields are rejected.
//! - `programmatic_settle_ms` stays within `100..=200`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

pub const DEFAULT_CONTENT_DEBOUNCE_MS: u64 = 1_000;
pub const DEFAULT_TITLE_DEBOUNCE_MS: u64 = 2_000;
pub const DEFAULT_TYPING_QUIET_MS: u64 = 2_000;
pub const DEFAULT_PROGRAMMATIC_SETTLE_MS: u64 = 150;
pub const DEFAULT_UNTITLED_TITLE: &str = "Untitled Note";

const PROGRAMMATIC_SETTLE_RANGE_MS: RangeInclusive<u64> = 100..=200;

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    /// Input is not valid JSON for `AutosaveConfig`.
    Parse(serde_json::Error),
    /// A field holds a value the engine cannot work with.
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid autosave config: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Timing and naming knobs for one autosave engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutosaveConfig {
    /// Quiet period after a content edit before it is saved.
    pub content_debounce_ms: u64,
    /// Quiet period after a title edit before it is saved.
    pub title_debounce_ms: u64,
    /// How long a title keystroke keeps the "user is typing" guard up.
    pub typing_quiet_ms: u64,
    /// Window after a programmatic editor replacement during which change
    /// events are treated as echo.
    pub programmatic_settle_ms: u64,
    /// Title substituted when a draft is created with a blank title.
    pub untitled_title: String,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            content_debounce_ms: DEFAULT_CONTENT_DEBOUNCE_MS,
            title_debounce_ms: DEFAULT_TITLE_DEBOUNCE_MS,
            typing_quiet_ms: DEFAULT_TYPING_QUIET_MS,
            programmatic_settle_ms: DEFAULT_PROGRAMMATIC_SETTLE_MS,
            untitled_title: DEFAULT_UNTITLED_TITLE.to_string(),
        }
    }
}

impl AutosaveConfig {
    /// Parses a JSON document and validates the result.
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed JSON or unknown fields.
    /// - `ConfigError::Invalid` when a value fails [`AutosaveConfig::validate`].
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("content_debounce_ms", self.content_debounce_ms),
            ("title_debounce_ms", self.title_debounce_ms),
            ("typing_quiet_ms", self.typing_quiet_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if !PROGRAMMATIC_SETTLE_RANGE_MS.contains(&self.programmatic_settle_ms) {
            return Err(ConfigError::Invalid {
                field: "programmatic_settle_ms",
                reason: format!(
                    "must be within {}..={} ms, got {}",
                    PROGRAMMATIC_SETTLE_RANGE_MS.start(),
                    PROGRAMMATIC_SETTLE_RANGE_MS.end(),
                    self.programmatic_settle_ms
                ),
            });
        }

        if self.untitled_title.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "untitled_title",
                reason: "cannot be blank".to_string(),
            });
        }

        Ok(())
    }
}
