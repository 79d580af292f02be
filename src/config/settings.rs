//! TOML-based configuration for aqp.
//!
//! Supports a config file (aqp.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [warehouse]
//! driver = "impala"
//! host = "localhost:21050"
//! database = "tpcds_500_parquet"
//! connection_string = "${AQP_WAREHOUSE_URL}"
//!
//! [worker]
//! path = "./aqp-worker"
//! timeout_seconds = 3600
//!
//! [metadata]
//! backend = "sqlite"
//! path = "~/.aqp/meta.db"
//!
//! [sampling]
//! z = 2.576
//! e = 0.01
//!
//! [planner]
//! abort_on_missing_prejoin = true
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::{ConnectionConfig, Driver};
use crate::model::{DEFAULT_E, DEFAULT_Z};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub warehouse: WarehouseSettings,
    pub worker: WorkerSettings,
    pub metadata: MetadataSettings,
    pub sampling: SamplingSettings,
    pub planner: PlannerSettings,
    pub logging: LoggingSettings,
}

/// Warehouse connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseSettings {
    /// Database driver (impala, hive, duckdb).
    pub driver: String,

    /// Host, optionally with port.
    pub host: String,

    /// Database holding the fact tables, prejoins and samples.
    pub database: String,

    /// Port; the driver default when unset and `host` carries none.
    pub port: Option<u16>,

    /// Explicit connection string (supports ${ENV_VAR} expansion).
    pub connection_string: Option<String>,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            driver: "impala".to_string(),
            host: "localhost".to_string(),
            database: "tpcds_500_parquet".to_string(),
            port: None,
            connection_string: None,
        }
    }
}

impl WarehouseSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Driver::from_str(&self.driver)
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<Option<String>, SettingsError> {
        self.connection_string
            .as_deref()
            .map(expand_env_vars)
            .transpose()
    }
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary.
    pub path: Option<String>,

    /// Extra command-line arguments for the worker.
    pub args: Vec<String>,

    /// Per-request timeout.
    pub timeout_seconds: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            timeout_seconds: 3600,
        }
    }
}

/// Where the metadata log lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    /// Local SQLite file.
    #[default]
    Sqlite,
    /// Log table inside the warehouse database.
    Warehouse,
}

/// Metadata store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataSettings {
    pub backend: MetadataBackend,

    /// SQLite file path. Defaults to `~/.aqp/meta.db`.
    pub path: Option<String>,

    /// Log table name for the warehouse backend.
    pub table: String,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            backend: MetadataBackend::Sqlite,
            path: None,
            table: "mymeta".to_string(),
        }
    }
}

impl MetadataSettings {
    /// SQLite path with `~` and environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        let Some(raw) = &self.path else {
            return Ok(None);
        };
        let expanded = expand_env_vars(raw)?;
        match expanded.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    SettingsError::InvalidConfig("cannot resolve home directory".to_string())
                })?;
                Ok(Some(home.join(rest)))
            }
            None => Ok(Some(PathBuf::from(expanded))),
        }
    }
}

/// Sampling parameters and decision thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Confidence z-score.
    pub z: f64,

    /// Error margin.
    pub e: f64,

    /// Average group size above which uniform sampling is considered.
    pub uniform_threshold: f64,

    /// Largest sample/population ratio worth materializing.
    pub min_io_reduction_ratio: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            z: DEFAULT_Z,
            e: DEFAULT_E,
            uniform_threshold: 100_000.0,
            min_io_reduction_ratio: 2.0 / 3.0,
        }
    }
}

/// Planner policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Stop the whole run when a multi-table query has no supporting prejoin.
    pub abort_on_missing_prejoin: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            abort_on_missing_prejoin: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `AQP_CONFIG`
    /// 2. `./aqp.toml`
    /// 3. `~/.config/aqp/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("AQP_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("aqp.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("aqp").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Replace `[warehouse]` values with any `AQP_DB_DRIVER`, `AQP_DB_HOST`,
    /// `AQP_DB_NAME` and `AQP_DB_PORT` set in the environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, var: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(driver) = var("AQP_DB_DRIVER") {
            self.warehouse.driver = driver;
        }
        if let Some(host) = var("AQP_DB_HOST") {
            self.warehouse.host = host;
        }
        if let Some(database) = var("AQP_DB_NAME") {
            self.warehouse.database = database;
        }
        if let Some(port) = var("AQP_DB_PORT") {
            let parsed = port.trim().parse().map_err(|_| {
                SettingsError::InvalidConfig(format!("AQP_DB_PORT is not a port: {}", port))
            })?;
            self.warehouse.port = Some(parsed);
        }
        Ok(())
    }

    /// Warehouse connection described by `[warehouse]`.
    pub fn connection(&self) -> Result<ConnectionConfig, SettingsError> {
        let mut config = ConnectionConfig::new(
            self.warehouse.driver_type()?,
            self.warehouse.host.clone(),
            self.warehouse.database.clone(),
        );
        config.port = self.warehouse.port;
        config.connection_string = self.warehouse.resolved_connection_string()?;
        Ok(config)
    }

    /// Get the worker binary path.
    ///
    /// Returns the configured path, or searches common locations and `PATH`.
    pub fn worker_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.worker.path {
            let expanded = expand_env_vars(path).ok()?;
            return Some(PathBuf::from(expanded));
        }

        let candidates = ["./aqp-worker", "./worker/aqp-worker"];
        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(output) = std::process::Command::new("which")
            .arg("aqp-worker")
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }

        None
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
