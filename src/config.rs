use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::catalog::ObjectType;
use crate::predict::{Observer, RetainMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid coordinates: {0}")]
    Coordinates(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub passes: PassConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    /// "lat, lon" in degrees.
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_query_url")]
    pub query_url: String,
    /// Credentials live in their own file, never inline in the main config.
    pub credentials_file: PathBuf,
    #[serde(default = "default_catalog_cache")]
    pub cache_file: PathBuf,
    /// Catalog freshness threshold.
    #[serde(default = "default_catalog_max_age", deserialize_with = "de_duration")]
    pub max_age: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub radius_km: f64,
    #[serde(deserialize_with = "de_duration")]
    pub horizon: Duration,
    pub retain: RetainMode,
    pub whitelist: Vec<ObjectType>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            radius_km: 200.0,
            horizon: Duration::hours(24),
            retain: RetainMode::All,
            whitelist: vec![
                ObjectType::Debris,
                ObjectType::RocketBody,
                ObjectType::Unknown,
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    pub cache_file: PathBuf,
    /// Pass-event freshness threshold, independent of the catalog's.
    #[serde(deserialize_with = "de_duration")]
    pub max_age: Duration,
    pub exclusion_log: PathBuf,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from("debris_data.json"),
            max_age: Duration::hours(1),
            exclusion_log: PathBuf::from("exclusion_log.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Full recompute interval (catalog + filter + prediction).
    #[serde(deserialize_with = "de_duration")]
    pub refresh_interval: Duration,
    /// In-memory reload of the pass cache, independent of the refresh.
    #[serde(deserialize_with = "de_duration")]
    pub reload_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::hours(24),
            reload_interval: Duration::hours(12),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[cfg_attr(not(feature = "audio"), allow(dead_code))]
pub struct AudioConfig {
    pub volume: f64,
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.4,
            sample_rate: 44_100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub identity: String,
    pub password: String,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn observer(&self) -> Result<Observer, ConfigError> {
        Observer::from_coordinates(&self.station.coordinates, Some(self.station.altitude_m))
            .ok_or_else(|| ConfigError::Coordinates(self.station.coordinates.clone()))
    }
}

fn default_login_url() -> String {
    "https://www.space-track.org/ajaxauth/login".to_string()
}

fn default_query_url() -> String {
    "https://www.space-track.org/basicspacedata/query/class/gp/decay_date/null-val/epoch/%3Enow-30/orderby/norad_cat_id/format/json".to_string()
}

fn default_catalog_cache() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_catalog_max_age() -> Duration {
    Duration::hours(24)
}

/// Humantime strings ("24h", "90m") to a chrono duration.
fn de_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(d)?;
    let std = humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)?;
    Duration::from_std(std).map_err(serde::de::Error::custom)
}
