//! Configuration file support for Run Log.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/runlog/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// How a paused live session picks up again
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResumePolicy {
    /// Resuming restarts the elapsed-time baseline at zero
    #[default]
    Restart,
    /// Resuming continues from the paused elapsed time
    Continue,
}

/// Live session parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Placeholder pace used to estimate distance (6 min/km)
    #[serde(default = "default_assumed_seconds_per_km")]
    pub assumed_seconds_per_km: f64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub resume: ResumePolicy,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            assumed_seconds_per_km: default_assumed_seconds_per_km(),
            tick_interval_ms: default_tick_interval_ms(),
            resume: ResumePolicy::default(),
        }
    }
}

/// Window sizes for the derived statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    #[serde(default = "default_chart_days")]
    pub chart_days: u32,

    #[serde(default = "default_chart_weeks")]
    pub chart_weeks: u32,

    #[serde(default = "default_calendar_days")]
    pub calendar_days: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            chart_days: default_chart_days(),
            chart_weeks: default_chart_weeks(),
            calendar_days: default_calendar_days(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("runlog")
}

fn default_assumed_seconds_per_km() -> f64 {
    360.0
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_recent_window() -> usize {
    crate::stats::DEFAULT_RECENT_WINDOW
}

fn default_chart_days() -> u32 {
    10
}

fn default_chart_weeks() -> u32 {
    12
}

fn default_calendar_days() -> u32 {
    28
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
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
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.live.assumed_seconds_per_km.is_finite() && self.live.assumed_seconds_per_km > 0.0)
        {
            return Err(Error::Config(format!(
                "live.assumed_seconds_per_km must be positive (got {})",
                self.live.assumed_seconds_per_km
            )));
        }
        if self.live.tick_interval_ms == 0 {
            return Err(Error::Config(
                "live.tick_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("runlog").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
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
        assert_eq!(config.live.assumed_seconds_per_km, 360.0);
        assert_eq!(config.live.tick_interval_ms, 1000);
        assert_eq!(config.live.resume, ResumePolicy::Restart);
        assert_eq!(config.stats.recent_window, 7);
        assert_eq!(config.stats.chart_days, 10);
        assert_eq!(config.stats.chart_weeks, 12);
        assert_eq!(config.stats.calendar_days, 28);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("runlog").join("config.toml");

        let mut config = Config::default();
        config.live.resume = ResumePolicy::Continue;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.live.resume, ResumePolicy::Continue);
        assert_eq!(parsed.stats.recent_window, config.stats.recent_window);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[live]
resume = "continue"

[stats]
chart_days = 14
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.live.resume, ResumePolicy::Continue);
        assert_eq!(config.live.assumed_seconds_per_km, 360.0); // default
        assert_eq!(config.stats.chart_days, 14);
        assert_eq!(config.stats.recent_window, 7); // default
    }

    #[test]
    fn test_invalid_pace_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[live]\nassumed_seconds_per_km = 0.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
