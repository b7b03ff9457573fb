use thiserror::Error;

/// Unified error type for webview discovery.
#[derive(Error, Debug)]
pub enum ScoutError {
    // ── Device channel errors ──────────────────────────────────
    #[error("adb command failed: {command}: {reason}")]
    Adb { command: String, reason: String },

    #[error("adb command timed out after {secs}s: {command}")]
    AdbTimeout { command: String, secs: u64 },

    #[error("no process found for pid {0}")]
    ProcessNotFound(u32),

    // ── Port allocation errors ─────────────────────────────────
    #[error(
        "cannot find any free port to forward the devtools socket in range {start}..{end}; \
         set the starting port with `discovery.devtools_port`"
    )]
    NoFreePort { start: u16, end: u16 },

    #[error("timed out after {waited_secs}s waiting for port guard {path}")]
    GuardTimeout { path: String, waited_secs: u64 },

    #[error("port guard error: {0}")]
    Guard(String),

    // ── DevTools errors ────────────────────────────────────────
    #[error("devtools request failed: {url}: {reason}")]
    DevTools { url: String, reason: String },

    // ── Context errors ─────────────────────────────────────────
    #[error("no such context: {0}")]
    NoSuchContext(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ScoutError>;
