//! # wvscout-core
//!
//! Core types and primitives for wvscout, the Android hybrid webview discovery
//! engine. This crate defines the shared vocabulary used by every other crate
//! in the workspace: the error type, the discovery data model and the tagged
//! stage result.

pub mod error;
pub mod outcome;
pub mod types;

pub use error::{Result, ScoutError};
pub use outcome::{DegradedCandidate, Degradation, Outcome};
pub use types::*;
