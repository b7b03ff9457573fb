//! # wvscout-cli
//!
//! Command-line interface for wvscout.
//!
//! ## Commands
//!
//! - `wvscout devices`: List attached Android devices
//! - `wvscout contexts`: List available contexts
//! - `wvscout webviews`: Show discovered webviews in detail
//! - `wvscout caps`: Compose Chromedriver capabilities for a context
//! - `wvscout config`: Show configuration
//! - `wvscout completions`: Generate shell completions

pub mod commands;

pub use commands::Cli;
