//! Application configuration
//!
//! Every section falls back to its defaults, so a partial JSON file is valid.

use crate::controls::{ControlsOptions, DEFAULT_ANIMATION_DURATION, DEFAULT_HIDE_DELAY};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarqueeConfig {
    pub controls: ControlsConfig,
    pub catalog: CatalogConfig,
    pub playback: PlaybackConfig,
}

/// Control overlay timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Delay before visible controls fade out (milliseconds)
    pub hide_delay_ms: u64,
    /// Fade duration (milliseconds)
    pub animation_duration_ms: u64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: DEFAULT_HIDE_DELAY.as_millis() as u64,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION.as_millis() as u64,
        }
    }
}

impl ControlsConfig {
    /// Overlay options starting in the given paused state
    pub fn options(&self, is_paused: bool) -> ControlsOptions {
        ControlsOptions {
            hide_delay: Duration::from_millis(self.hide_delay_ms),
            animation_duration: Duration::from_millis(self.animation_duration_ms),
            is_paused,
        }
    }
}

/// Catalog source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Simulated fetch latency (milliseconds)
    pub latency_ms: u64,
    /// JSON catalog to serve instead of the demo titles
    pub path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1000,
            path: None,
        }
    }
}

/// Simulated media settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Interval between progress events (milliseconds)
    pub progress_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 250,
        }
    }
}

impl MarqueeConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: MarqueeConfig = serde_json::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Reject timings the overlay and player cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.controls.hide_delay_ms == 0 {
            return Err(Error::InvalidConfig(
                "controls.hide_delay_ms must be positive".into(),
            ));
        }
        if self.controls.animation_duration_ms > self.controls.hide_delay_ms {
            return Err(Error::InvalidConfig(
                "controls.animation_duration_ms must not exceed controls.hide_delay_ms".into(),
            ));
        }
        if self.playback.progress_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "playback.progress_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Pretty JSON for this configuration
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_player_timings() {
        let config = MarqueeConfig::default();
        assert_eq!(config.controls.hide_delay_ms, 4000);
        assert_eq!(config.controls.animation_duration_ms, 200);
        assert_eq!(config.catalog.latency_ms, 1000);
        assert!(config.validate().is_ok());

        let options = config.controls.options(true);
        assert_eq!(options.hide_delay, Duration::from_secs(4));
        assert!(options.is_paused);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"controls": {{"hide_delay_ms": 2500}}}}"#).unwrap();

        let config = MarqueeConfig::load(file.path()).unwrap();
        assert_eq!(config.controls.hide_delay_ms, 2500);
        assert_eq!(config.controls.animation_duration_ms, 200);
        assert_eq!(config.playback.progress_interval_ms, 250);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = MarqueeConfig::default();
        config.controls.hide_delay_ms = 0;
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");

        let mut config = MarqueeConfig::default();
        config.controls.animation_duration_ms = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = MarqueeConfig::load(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "JSON");
    }
}
