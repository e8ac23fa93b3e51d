//! Configuration file support for Lunacal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lunacal/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user_id: default_user_id(),
        }
    }
}

/// Heuristic parameters for statistics, prediction and calendar painting
///
/// The defaults are the simple moving-average model: a 28 day fallback
/// length, a fixed 14 day luteal phase and a 5 day ovulation window.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsConfig {
    #[serde(default = "default_cycle_length_days")]
    pub default_cycle_length_days: i64,

    #[serde(default = "default_luteal_phase_days")]
    pub luteal_phase_days: i64,

    #[serde(default = "default_ovulation_window_radius_days")]
    pub ovulation_window_radius_days: i64,

    #[serde(default = "default_min_cycles_for_prediction")]
    pub min_cycles_for_prediction: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_cycle_length_days: default_cycle_length_days(),
            luteal_phase_days: default_luteal_phase_days(),
            ovulation_window_radius_days: default_ovulation_window_radius_days(),
            min_cycles_for_prediction: default_min_cycles_for_prediction(),
        }
    }
}

/// Fewest records a prediction may ever be based on
pub const MIN_CYCLES_FOR_PREDICTION: usize = 2;

/// Upper bound for any day-count parameter
pub const MAX_CYCLE_LENGTH_DAYS: i64 = 366;

impl AnalyticsConfig {
    /// Reject parameter combinations the engine cannot work with
    ///
    /// Day counts must stay within one year, the ovulation window must fit
    /// inside the luteal offset, and a prediction needs at least
    /// [`MIN_CYCLES_FOR_PREDICTION`] records.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CYCLE_LENGTH_DAYS).contains(&self.default_cycle_length_days) {
            return Err(Error::Config(format!(
                "default_cycle_length_days must be between 1 and {}, got {}",
                MAX_CYCLE_LENGTH_DAYS, self.default_cycle_length_days
            )));
        }
        if !(1..=MAX_CYCLE_LENGTH_DAYS).contains(&self.luteal_phase_days) {
            return Err(Error::Config(format!(
                "luteal_phase_days must be between 1 and {}, got {}",
                MAX_CYCLE_LENGTH_DAYS, self.luteal_phase_days
            )));
        }
        if !(0..=self.luteal_phase_days).contains(&self.ovulation_window_radius_days) {
            return Err(Error::Config(format!(
                "ovulation_window_radius_days must be within 0..={}, got {}",
                self.luteal_phase_days, self.ovulation_window_radius_days
            )));
        }
        if self.min_cycles_for_prediction < MIN_CYCLES_FOR_PREDICTION {
            return Err(Error::Config(format!(
                "min_cycles_for_prediction must be at least {}, got {}",
                MIN_CYCLES_FOR_PREDICTION, self.min_cycles_for_prediction
            )));
        }
        Ok(())
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("lunacal")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_cycle_length_days() -> i64 {
    28
}

fn default_luteal_phase_days() -> i64 {
    14
}

fn default_ovulation_window_radius_days() -> i64 {
    2
}

fn default_min_cycles_for_prediction() -> usize {
    2
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.analytics.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("lunacal").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.user_id, "local");
        assert_eq!(config.analytics.default_cycle_length_days, 28);
        assert_eq!(config.analytics.luteal_phase_days, 14);
        assert_eq!(config.analytics.ovulation_window_radius_days, 2);
        assert_eq!(config.analytics.min_cycles_for_prediction, 2);
        assert!(config.analytics.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[analytics]
luteal_phase_days = 13
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.analytics.luteal_phase_days, 13);
        assert_eq!(config.analytics.default_cycle_length_days, 28); // default
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.user_id = "alex".into();
        config.analytics.ovulation_window_radius_days = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.user_id, "alex");
        assert_eq!(loaded.analytics, config.analytics);
    }

    #[test]
    fn test_invalid_analytics_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\ndefault_cycle_length_days = 0\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_single_cycle_prediction_threshold_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\nmin_cycles_for_prediction = 1\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        let mut analytics = AnalyticsConfig::default();
        analytics.min_cycles_for_prediction = 3;
        assert!(analytics.validate().is_ok());
    }

    #[test]
    fn test_day_counts_bounded() {
        let mut analytics = AnalyticsConfig::default();
        analytics.luteal_phase_days = 1_000_000_000_000;
        assert!(matches!(analytics.validate(), Err(Error::Config(_))));

        let mut analytics = AnalyticsConfig::default();
        analytics.luteal_phase_days = 0;
        assert!(matches!(analytics.validate(), Err(Error::Config(_))));

        let mut analytics = AnalyticsConfig::default();
        analytics.ovulation_window_radius_days = 15;
        assert!(matches!(analytics.validate(), Err(Error::Config(_))));

        let mut analytics = AnalyticsConfig::default();
        analytics.default_cycle_length_days = 400;
        assert!(matches!(analytics.validate(), Err(Error::Config(_))));
    }
}
