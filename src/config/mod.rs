//! Configuration module for aqp.
//!
//! Handles connection configuration, environment variables, settings and
//! workload files.

mod connection;
mod settings;
mod workload;

pub use connection::{ConnectionConfig, ConnectionError, Driver};
pub use settings::{
    expand_env_vars, LoggingSettings, MetadataBackend, MetadataSettings, PlannerSettings,
    SamplingSettings, Settings, SettingsError, WarehouseSettings, WorkerSettings,
};
pub use workload::{load_workload, parse_workload, WorkloadError, WorkloadResult};
