//! Warehouse connection configuration.
//!
//! Built by [`Settings::connection`](super::Settings::connection) from the
//! `[connection]` table and the `AQP_DB_*` environment overrides.

use crate::worker::protocol::Target;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Unsupported driver: {0}. Supported: impala, hive, duckdb")]
    UnsupportedDriver(String),
}

/// Supported warehouse drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    /// Apache Impala
    #[default]
    Impala,
    /// Apache Hive (HiveServer2)
    Hive,
    /// DuckDB (file or in-memory), for local runs
    DuckDb,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "impala" => Ok(Driver::Impala),
            "hive" | "hiveserver2" => Ok(Driver::Hive),
            "duckdb" | "duck" => Ok(Driver::DuckDb),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Get the driver name for the worker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Impala => "impala",
            Driver::Hive => "hive",
            Driver::DuckDb => "duckdb",
        }
    }

    /// Get the default port for this driver.
    pub fn default_port(&self) -> u16 {
        match self {
            Driver::Impala => 21050,
            Driver::Hive => 10000,
            Driver::DuckDb => 0,
        }
    }
}

/// Warehouse connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub driver: Driver,
    /// Server hostname, or file path for DuckDB.
    pub host: String,
    pub database: String,
    pub port: Option<u16>,
    /// Explicit connection string; bypasses the builder when set.
    pub connection_string: Option<String>,
}

impl ConnectionConfig {
    pub fn new(driver: Driver, host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            driver,
            host: host.into(),
            database: database.into(),
            port: None,
            connection_string: None,
        }
    }

    /// Build the connection string for the worker.
    pub fn to_connection_string(&self) -> String {
        if let Some(explicit) = &self.connection_string {
            return explicit.clone();
        }
        match self.driver {
            Driver::Impala | Driver::Hive => self.build_server_connection_string(),
            Driver::DuckDb => self.build_duckdb_connection_string(),
        }
    }

    fn build_server_connection_string(&self) -> String {
        // Host may already carry a port ("node1:21050").
        let authority = match (self.port, self.host.contains(':')) {
            (Some(port), _) => format!("{}:{}", self.host, port),
            (None, true) => self.host.clone(),
            (None, false) => format!("{}:{}", self.host, self.driver.default_port()),
        };
        format!("{}://{}/{}", self.driver.as_str(), authority, self.database)
    }

    fn build_duckdb_connection_string(&self) -> String {
        if self.host.is_empty() || self.host == ":memory:" {
            ":memory:".to_string()
        } else {
            self.host.clone()
        }
    }

    /// Worker session target for this configuration.
    pub fn to_target(&self) -> Target {
        Target {
            driver: self.driver.as_str().to_string(),
            connection_string: self.to_connection_string(),
        }
    }
}
