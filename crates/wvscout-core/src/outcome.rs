//! Tagged result for best-effort discovery stages.
//!
//! A stage that can fail without aborting the run returns [`Outcome`] instead
//! of [`crate::Result`]. The degradation is carried as data so callers (and
//! tests) can see exactly which candidate was dropped or left incomplete.

use serde::{Deserialize, Serialize};

/// Why a candidate was dropped or is missing details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Socket name matched no known devtools naming convention.
    Unclassified,
    /// An explicit device socket was requested and this is not it.
    FilteredBySocket { expected: String },
    /// PID-suffixed socket whose owning process could not be found.
    ProcessUnresolved { pid: String, reason: String },
    /// No local port could be reserved for the socket.
    PortAllocation { reason: String },
    /// The local port was reserved but `adb forward` failed.
    ForwardFailed { reason: String },
    /// A DevTools endpoint did not answer usefully.
    ProbeFailed { endpoint: String, reason: String },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degradation::Unclassified => write!(f, "not a devtools socket"),
            Degradation::FilteredBySocket { expected } => {
                write!(f, "does not match device socket '{expected}'")
            }
            Degradation::ProcessUnresolved { pid, reason } => {
                write!(f, "cannot resolve process for pid {pid}: {reason}")
            }
            Degradation::PortAllocation { reason } => write!(f, "port allocation failed: {reason}"),
            Degradation::ForwardFailed { reason } => write!(f, "port forward failed: {reason}"),
            Degradation::ProbeFailed { endpoint, reason } => {
                write!(f, "{endpoint} probe failed: {reason}")
            }
        }
    }
}

/// Result of a best-effort stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Degraded(Degradation),
}

/// A degradation recorded against a specific socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedCandidate {
    pub proc: String,
    pub reason: Degradation,
}
