//! Runtime configuration.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigParseError;
use crate::render::EmbedOptions;

/// Tunables shared by the standard hooks.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use oxide_hooks::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "visibility_threshold": 0.25 }"#).unwrap();
///
/// assert_eq!(config.visibility_threshold, 0.25);
/// assert_eq!(config.navigation_settle_delay_ms, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Fraction of an element that must intersect the viewport to count as visible.
    pub visibility_threshold: f64,
    /// How long to let the DOM settle after a navigation before re-scanning.
    pub navigation_settle_delay_ms: u64,
    /// Selector for SVG elements that receive click listeners.
    pub interactive_selector: String,
    /// Window event signalling that a navigation completed.
    pub navigation_event: String,
    /// Prefix of the per-view specification init event (`<prefix>:<id>:init`).
    pub spec_event_prefix: String,
    pub embed: EmbedOptions,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.1,
            navigation_settle_delay_ms: 50,
            interactive_selector: ".data-point".to_owned(),
            navigation_event: "phx:page-loading-stop".to_owned(),
            spec_event_prefix: "vega_lite".to_owned(),
            embed: EmbedOptions::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(source: &str) -> Result<Self, ConfigParseError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigParseError> {
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigParseError::InvalidValue {
                field: "visibility_threshold",
                reason: format!("{} is outside 0.0..=1.0", self.visibility_threshold),
            });
        }
        if self.interactive_selector.trim().is_empty() {
            return Err(ConfigParseError::InvalidValue {
                field: "interactive_selector",
                reason: "selector is empty".to_owned(),
            });
        }
        Ok(())
    }

    pub fn navigation_settle_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_delay_ms)
    }
}
