//! Configuration for rule execution.

use std::collections::BTreeMap;

use chrono::{FixedOffset, Offset, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration shared by every execution of a component.
///
/// Controls auto-saving, how unresolved tokens are rendered, and the time
/// zone and named patterns used by date formatting qualifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Whether entities marked by actions are saved after execution.
    pub auto_save: bool,

    /// Offset from UTC, in seconds, applied when formatting dates.
    pub utc_offset_seconds: i32,

    /// Replace unresolvable tokens with an empty string (false keeps them verbatim).
    pub clear_unresolved_tokens: bool,

    /// Named date patterns usable as selector qualifiers (`[node:created:short]`).
    pub date_formats: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let date_formats = [
            ("short", "m/d/Y - H:i"),
            ("medium", "D, m/d/Y - H:i"),
            ("long", "l, F j, Y - H:i"),
            ("html_date", "Y-m-d"),
            ("html_time", "H:i:s"),
            ("html_datetime", "Y-m-d\\TH:i:sO"),
            ("html_month", "Y-m"),
            ("html_year", "Y"),
        ]
        .into_iter()
        .map(|(name, pattern)| (name.to_string(), pattern.to_string()))
        .collect();

        Self {
            auto_save: true,
            utc_offset_seconds: 0,
            clear_unresolved_tokens: true,
            date_formats,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable/disable auto-saving.
    #[must_use]
    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    /// Builder method to set the UTC offset used for date formatting.
    #[must_use]
    pub fn with_utc_offset(mut self, seconds: i32) -> Self {
        self.utc_offset_seconds = seconds;
        self
    }

    /// Builder method to keep unresolved tokens verbatim.
    #[must_use]
    pub fn with_clear_unresolved_tokens(mut self, clear: bool) -> Self {
        self.clear_unresolved_tokens = clear;
        self
    }

    /// Builder method to add or replace a named date pattern.
    #[must_use]
    pub fn with_date_format(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.date_formats.insert(name.into(), pattern.into());
        self
    }

    /// Returns the pattern registered under `name`.
    #[must_use]
    pub fn date_format(&self, name: &str) -> Option<&str> {
        self.date_formats.get(name).map(String::as_str)
    }

    /// Returns the time zone used for date formatting.
    ///
    /// Out-of-range offsets fall back to UTC.
    #[must_use]
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix())
    }
}
