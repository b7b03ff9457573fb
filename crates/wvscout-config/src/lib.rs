//! # wvscout-config
//!
//! Configuration system for wvscout. Reads from `wvscout.toml`, then
//! environment variables, then CLI overrides: later sources win.

pub mod schema;
pub mod loader;

pub use schema::ScoutConfig;
pub use schema::{
    ConfigWarning, DeviceConfig, DiscoveryConfig, LoggingConfig, PortGuardConfig,
    WarningSeverity,
};
pub use loader::ConfigLoader;
