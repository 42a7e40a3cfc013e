// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Stored as JSON. Every field has a default, so a partial file only
//! overrides what it names.

use crate::constants::{CooldownPolicy, analysis, app_info, scoring, timing};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Inclusive band a scoring signal must fall in to earn its share
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Band<T> {
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Bands used by the line scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringBands {
    /// Polarity transitions per row
    pub transitions: Band<usize>,
    /// Run-width variance (pixel²)
    pub variance: Band<f32>,
    /// Run count per row
    pub runs: Band<usize>,
}

impl Default for ScoringBands {
    fn default() -> Self {
        Self {
            transitions: Band {
                min: scoring::TRANSITIONS_MIN,
                max: scoring::TRANSITIONS_MAX,
            },
            variance: Band {
                min: scoring::VARIANCE_MIN,
                max: scoring::VARIANCE_MAX,
            },
            runs: Band {
                min: scoring::RUNS_MIN,
                max: scoring::RUNS_MAX,
            },
        }
    }
}

/// CODE128 decoder switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Retry the pattern back to front (symbol upside down)
    pub try_reversed: bool,
    /// Derive digits from run widths when no symbol is found
    pub numeric_fallback: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            try_reversed: true,
            numeric_fallback: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Pause after each tick before the next one starts
    pub tick_interval_ms: u64,
    /// Settling delay between playback start and the first tick
    pub detection_start_delay_ms: u64,
    /// Bound on waiting for the sink to start playing
    pub ready_timeout_ms: u64,
    /// Centered fraction of the frame height that is scanned
    pub band_fraction: f32,
    /// Analyze every Nth row inside the band
    pub row_step: u32,
    /// Luminance below this is a bar
    pub luminance_threshold: u8,
    /// Tick score needed before decoding is attempted
    pub min_score: f32,
    /// Window in which repeat emissions are suppressed
    pub cooldown_ms: u64,
    pub cooldown_policy: CooldownPolicy,
    pub scoring: ScoringBands,
    pub decoder: DecoderConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: timing::TICK_INTERVAL.as_millis() as u64,
            detection_start_delay_ms: timing::DETECTION_START_DELAY.as_millis() as u64,
            ready_timeout_ms: timing::READY_TIMEOUT.as_millis() as u64,
            band_fraction: analysis::BAND_FRACTION,
            row_step: analysis::ROW_STEP,
            luminance_threshold: analysis::LUMINANCE_THRESHOLD,
            min_score: analysis::MIN_SCORE,
            cooldown_ms: timing::COOLDOWN.as_millis() as u64,
            cooldown_policy: CooldownPolicy::default(),
            scoring: ScoringBands::default(),
            decoder: DecoderConfig::default(),
        }
    }
}

impl ScannerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn detection_start_delay(&self) -> Duration {
        Duration::from_millis(self.detection_start_delay_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Default location: `<config dir>/pos-scanner/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(app_info::CONFIG_DIR_NAME)
                .join(app_info::CONFIG_FILE_NAME)
        })
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded scanner config");
        Ok(config)
    }

    /// Load from an explicit path, or the default path if it exists
    ///
    /// A missing default file yields defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0".into()));
        }
        if self.row_step == 0 {
            return Err(ConfigError::Invalid("row_step must be > 0".into()));
        }
        if !(self.band_fraction > 0.0 && self.band_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "band_fraction {} outside (0, 1]",
                self.band_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ConfigError::Invalid(format!(
                "min_score {} outside [0, 1]",
                self.min_score
            )));
        }
        let bands = &self.scoring;
        if bands.transitions.min > bands.transitions.max
            || bands.variance.min > bands.variance.max
            || bands.runs.min > bands.runs.max
        {
            return Err(ConfigError::Invalid("scoring band min exceeds max".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_contains_is_inclusive() {
        let band = Band { min: 2.0, max: 50.0 };
        assert!(band.contains(2.0));
        assert!(band.contains(50.0));
        assert!(!band.contains(50.1));
    }

    #[test]
    fn test_durations_follow_fields() {
        let config = ScannerConfig {
            tick_interval_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.ready_timeout(), Duration::from_secs(10));
    }
}
