//! Server configuration read from the environment

use sales_forecast::ModelKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "sales_server=info,tower_http=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the persisted model artifact
    pub model_dir: PathBuf,
    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,
    /// Longest date range a single `/predict` call may ask for
    pub max_prediction_days: usize,
    /// Model trained when an upload does not name one
    pub default_model: ModelKind,
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_dir: PathBuf::from("./models"),
            max_upload_bytes: 10 * 1024 * 1024,
            max_prediction_days: 3660,
            default_model: ModelKind::RandomForest,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            model_dir: lookup("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_prediction_days: parse_var(
                &lookup,
                "MAX_PREDICTION_DAYS",
                defaults.max_prediction_days,
            )?,
            default_model: parse_var(&lookup, "DEFAULT_MODEL", defaults.default_model)?,
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }

    /// Address to bind, from `host` and `port`
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        match addr.parse() {
            Ok(addr) => Ok(addr),
            Err(_) => Err(ConfigError::Invalid {
                key: "HOST".to_string(),
                value: self.host.clone(),
            }),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };

    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
    }
}
