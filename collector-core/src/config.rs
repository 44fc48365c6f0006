use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::model::Location;

/// Environment variable pointing at an explicit TOML config file.
pub const CONFIG_PATH_ENV: &str = "WEATHER_COLLECTOR_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Broker connection settings.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub queue_name: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "rabbitmq".to_string(),
            port: 5672,
            user: "guest".to_string(),
            password: "guest".to_string(),
            queue_name: "weather_logs_queue".to_string(),
        }
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("queue_name", &self.queue_name)
            .finish()
    }
}

/// Upstream weather API settings.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            api_key: String::new(),
            latitude: 40.7128,
            longitude: -74.0060,
        }
    }
}

impl ApiConfig {
    pub fn location(&self) -> Location {
        Location { latitude: self.latitude, longitude: self.longitude }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &key)
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .finish()
    }
}

/// Process configuration, built once at startup and passed by reference.
///
/// Example TOML:
/// [broker]
/// host = "localhost"
/// queue_name = "weather_logs_queue"
///
/// [api]
/// api_key = "..."
/// latitude = 52.37
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub api: ApiConfig,
}

impl Config {
    /// Defaults, then the optional config file, then the process environment.
    pub fn load() -> Result<Self> {
        let mut cfg = match Self::config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Explicit path from the environment, otherwise the platform config dir.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        ProjectDirs::from("dev", "weather-collector", "weather-collector")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Override fields from environment-style variables resolved by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(*k));

        if let Some(host) = first(&["RABBITMQ_HOST"]) {
            self.broker.host = host;
        }
        if let Some(port) = first(&["RABBITMQ_PORT"]) {
            self.broker.port = parse_value("RABBITMQ_PORT", &port)?;
        }
        if let Some(user) = first(&["RABBITMQ_USER", "RABBITMQ_DEFAULT_USER"]) {
            self.broker.user = user;
        }
        if let Some(password) = first(&["RABBITMQ_PASS", "RABBITMQ_DEFAULT_PASS"]) {
            self.broker.password = password;
        }
        if let Some(queue) = first(&["QUEUE_NAME"]) {
            self.broker.queue_name = queue;
        }
        if let Some(url) = first(&["API_BASE_URL"]) {
            // Older deployments carried a trailing '?' for manual query building.
            self.api.base_url = url.trim_end_matches('?').to_string();
        }
        if let Some(key) = first(&["WEATHER_API_KEY"]) {
            self.api.api_key = key;
        }
        if let Some(lat) = first(&["LATITUDE"]) {
            self.api.latitude = parse_coordinate("LATITUDE", &lat, 90.0)?;
        }
        if let Some(lon) = first(&["LONGITUDE"]) {
            self.api.longitude = parse_coordinate("LONGITUDE", &lon, 180.0)?;
        }

        Ok(())
    }

    /// Reject values that would make every cycle fail.
    pub fn validate(&self) -> Result<()> {
        if self.broker.queue_name.trim().is_empty() {
            return Err(anyhow!("Queue name must not be empty"));
        }
        if self.broker.host.trim().is_empty() {
            return Err(anyhow!("Broker host must not be empty"));
        }
        Ok(())
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_coordinate(key: &'static str, raw: &str, bound: f64) -> Result<f64, ConfigError> {
    let value: f64 = parse_value(key, raw)?;
    if !value.is_finite() || value.abs() > bound {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: format!("must be within ±{bound}"),
        });
    }
    Ok(value)
}
