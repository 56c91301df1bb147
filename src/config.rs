//! Runtime configuration for the report client
//!
//! Every field has a default, so an empty JSON object is a valid configuration.
//!
//! ```rust
//! use dioxus_studio_reports::config::ReportsConfig;
//!
//! let config = ReportsConfig::from_json_str(r#"{"api_base_url": "http://localhost:8080/platform"}"#).unwrap();
//! assert_eq!(config.refresh_indicator_delay().as_millis(), 1000);
//! ```

use serde::Deserialize;
use std::{path::Path, time::Duration};
use thiserror::Error;

use crate::{date_range::DatePickerHelper, platform};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

fn default_api_base_url() -> String {
    "https://api.supabase.com/platform".to_string()
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

fn default_refresh_indicator_delay_ms() -> u64 {
    millis(platform::DEFAULT_REFRESH_INDICATOR_DELAY)
}

fn default_database_selector_delay_ms() -> u64 {
    millis(platform::DEFAULT_DATABASE_SELECTOR_DELAY)
}

fn default_chart_focus_delay_ms() -> u64 {
    millis(platform::DEFAULT_CHART_FOCUS_DELAY)
}

fn default_stale_time_secs() -> u64 {
    platform::DEFAULT_STALE_TIME.as_secs()
}

fn default_max_cache_size() -> usize {
    platform::DEFAULT_MAX_CACHE_SIZE
}

fn default_maintenance_interval_secs() -> u64 {
    platform::DEFAULT_MAINTENANCE_INTERVAL.as_secs()
}

fn default_date_helper() -> DatePickerHelper {
    DatePickerHelper::Last60Minutes
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_refresh_indicator_delay_ms")]
    pub refresh_indicator_delay_ms: u64,
    #[serde(default = "default_database_selector_delay_ms")]
    pub database_selector_delay_ms: u64,
    #[serde(default = "default_chart_focus_delay_ms")]
    pub chart_focus_delay_ms: u64,
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
    /// Entries kept by cache maintenance
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
    /// Preset applied when the report first mounts
    #[serde(default = "default_date_helper")]
    pub default_date_helper: DatePickerHelper,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            access_token: None,
            refresh_indicator_delay_ms: default_refresh_indicator_delay_ms(),
            database_selector_delay_ms: default_database_selector_delay_ms(),
            chart_focus_delay_ms: default_chart_focus_delay_ms(),
            stale_time_secs: default_stale_time_secs(),
            max_cache_size: default_max_cache_size(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
            default_date_helper: default_date_helper(),
        }
    }
}

impl ReportsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn refresh_indicator_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_indicator_delay_ms)
    }

    pub fn database_selector_delay(&self) -> Duration {
        Duration::from_millis(self.database_selector_delay_ms)
    }

    pub fn chart_focus_delay(&self) -> Duration {
        Duration::from_millis(self.chart_focus_delay_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }
}
