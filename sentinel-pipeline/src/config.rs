//! Alert threshold configuration.
//!
//! Thresholds are an explicit value handed to every analysis. They load
//! from a TOML file with camelCase keys; omitted keys keep their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sentinel_stats::thresholds;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Normalized units slope floor for the declining-trend rule.
    pub slope_floor: f64,
    /// Average weekly units required by volume-sensitive rules.
    pub min_volume: f64,
    pub yoy_drop_floor: f64,
    pub min_weeks_down: usize,
    pub return_ratio_ceiling: f64,
    pub returns_slope_ceiling: f64,
    pub wow_drop_floor: f64,
    pub yoy_same_week_drop_floor: f64,
    pub window_weeks: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            slope_floor: thresholds::SLOPE_FLOOR,
            min_volume: thresholds::MIN_VOLUME,
            yoy_drop_floor: thresholds::YOY_DROP_FLOOR,
            min_weeks_down: thresholds::MIN_WEEKS_DOWN,
            return_ratio_ceiling: thresholds::RETURN_RATIO_CEILING,
            returns_slope_ceiling: thresholds::RETURNS_SLOPE_CEILING,
            wow_drop_floor: thresholds::WOW_DROP_FLOOR,
            yoy_same_week_drop_floor: thresholds::YOY_SAME_WEEK_DROP_FLOOR,
            window_weeks: thresholds::WINDOW_WEEKS,
        }
    }
}

impl ThresholdConfig {
    /// Prior-year weeks needed before a YoY comparison counts as available.
    ///
    /// Tolerates one missing week, with an absolute floor of three.
    pub fn min_prior_year_weeks(&self) -> usize {
        thresholds::MIN_PRIOR_YEAR_WEEKS.max(self.window_weeks.saturating_sub(1))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_weeks == 0 {
            return Err(ConfigError::Invalid("windowWeeks must be at least 1".into()));
        }
        if self.min_weeks_down == 0 {
            return Err(ConfigError::Invalid("minWeeksDown must be at least 1".into()));
        }

        let ratios = [
            ("slopeFloor", self.slope_floor),
            ("minVolume", self.min_volume),
            ("yoyDropFloor", self.yoy_drop_floor),
            ("returnRatioCeiling", self.return_ratio_ceiling),
            ("returnsSlopeCeiling", self.returns_slope_ceiling),
            ("wowDropFloor", self.wow_drop_floor),
            ("yoySameWeekDropFloor", self.yoy_same_week_drop_floor),
        ];
        if let Some((name, _)) = ratios.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be a finite number")));
        }
        if self.min_volume < 0.0 {
            return Err(ConfigError::Invalid("minVolume must not be negative".into()));
        }

        Ok(())
    }
}

/// Parse and validate thresholds from TOML text.
pub fn parse_thresholds(raw: &str) -> Result<ThresholdConfig, ConfigError> {
    let config: ThresholdConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Load thresholds from a TOML file.
pub fn load_thresholds(path: impl AsRef<Path>) -> Result<ThresholdConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    parse_thresholds(&raw)
}
