use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration: maps to `wvscout.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub device: DeviceConfig,
    pub discovery: DiscoveryConfig,
    pub port_guard: PortGuardConfig,
    pub logging: LoggingConfig,
}

// ── Device ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial of the device to target (None = let adb pick the single device).
    pub serial: Option<String>,
    /// adb executable.
    pub adb_path: String,
    /// Host the forwarded DevTools ports are reachable on. Set this when the
    /// adb server runs on another machine.
    pub adb_host: String,
    /// Upper bound for a single adb invocation.
    pub command_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_path: "adb".into(),
            adb_host: "127.0.0.1".into(),
            command_timeout_secs: 30,
        }
    }
}

// ── Discovery ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Only consider this abstract socket (without the leading '@').
    /// `chrome_devtools_remote` selects the embedded Chromium context.
    pub device_socket: Option<String>,
    /// Drop webviews whose page list was fetched and turned out empty.
    pub ensure_webviews_have_pages: bool,
    /// Query `/json/version` for every webview and cache the result.
    pub enable_details_collection: bool,
    /// First local port to try when forwarding devtools sockets.
    pub devtools_port: Option<u16>,
    /// Keep polling for webviews for up to this many milliseconds.
    pub wait_for_webview_ms: u64,
    /// The session drives Chrome itself; only `CHROMIUM` is listed.
    pub chrome_session: bool,
    /// Fail the whole discovery run when no local port is free.
    pub port_exhaustion_fatal: bool,
    /// `/proc/net/unix` Flags column value of a listening socket.
    pub listening_flags: String,
    /// `/proc/net/unix` St column value of a listening socket.
    pub listening_state: String,
    /// Timeout for each DevTools HTTP request.
    pub probe_timeout_ms: u64,
    /// Maximum number of cached webview details.
    pub cache_capacity: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            device_socket: None,
            ensure_webviews_have_pages: true,
            enable_details_collection: true,
            devtools_port: None,
            wait_for_webview_ms: 0,
            chrome_session: false,
            port_exhaustion_fatal: false,
            listening_flags: "00010000".into(),
            listening_state: "01".into(),
            probe_timeout_ms: 2000,
            cache_capacity: 100,
        }
    }
}

// ── Port guard ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortGuardConfig {
    /// Lock file shared by every wvscout process on this host.
    pub lock_path: PathBuf,
    /// How long to wait for the lock before giving up.
    pub timeout_secs: u64,
    /// On timeout, remove the lock file once and retry.
    pub try_recovery: bool,
    /// Number of ports scanned from the start port.
    pub port_window: u16,
    /// Start port when `discovery.devtools_port` is unset.
    pub base_port: u16,
}

impl Default for PortGuardConfig {
    fn default() -> Self {
        Self {
            lock_path: std::env::temp_dir().join("android_devtools_port_guard"),
            timeout_secs: 7,
            try_recovery: true,
            port_window: 100,
            base_port: 10900,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A config validation finding.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl ScoutConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Port window ───
        if self.discovery.devtools_port == Some(0) {
            warnings.push(ConfigWarning {
                field: "discovery.devtools_port".into(),
                message: "port 0 is not a usable forward target".into(),
                severity: WarningSeverity::Error,
                hint: Some(format!(
                    "Unset it to start at {}",
                    self.port_guard.base_port
                )),
            });
        }
        let start = self
            .discovery
            .devtools_port
            .filter(|p| *p != 0)
            .unwrap_or(self.port_guard.base_port);
        if self.port_guard.port_window == 0 {
            warnings.push(ConfigWarning {
                field: "port_guard.port_window".into(),
                message: "port window is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 100".into()),
            });
        } else if start.checked_add(self.port_guard.port_window).is_none() {
            warnings.push(ConfigWarning {
                field: "discovery.devtools_port".into(),
                message: format!(
                    "port window {}..{} exceeds 65535",
                    start,
                    start as u32 + self.port_guard.port_window as u32
                ),
                severity: WarningSeverity::Error,
                hint: Some("Pick a lower starting port".into()),
            });
        }
        if start < 1024 {
            warnings.push(ConfigWarning {
                field: "discovery.devtools_port".into(),
                message: format!("port {start} is privileged"),
                severity: WarningSeverity::Warning,
                hint: Some("Ports below 1024 usually need root to bind".into()),
            });
        }

        // ── Probe timeout ───
        if self.discovery.probe_timeout_ms == 0 {
            warnings.push(ConfigWarning {
                field: "discovery.probe_timeout_ms".into(),
                message: "probe timeout is 0: every DevTools request would fail".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 2000".into()),
            });
        }

        // ── Cache ───
        if self.discovery.cache_capacity == 0 {
            warnings.push(ConfigWarning {
                field: "discovery.cache_capacity".into(),
                message: "cache capacity is 0".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 100".into()),
            });
        }

        // ── Socket table constants ───
        let is_hex = |s: &str, len: usize| {
            s.len() == len && s.chars().all(|c| c.is_ascii_hexdigit())
        };
        if !is_hex(&self.discovery.listening_flags, 8) {
            warnings.push(ConfigWarning {
                field: "discovery.listening_flags".into(),
                message: format!(
                    "'{}' does not look like a /proc/net/unix Flags value",
                    self.discovery.listening_flags
                ),
                severity: WarningSeverity::Warning,
                hint: Some("Expected 8 hex digits, e.g. 00010000".into()),
            });
        }
        if !is_hex(&self.discovery.listening_state, 2) {
            warnings.push(ConfigWarning {
                field: "discovery.listening_state".into(),
                message: format!(
                    "'{}' does not look like a /proc/net/unix St value",
                    self.discovery.listening_state
                ),
                severity: WarningSeverity::Warning,
                hint: Some("Expected 2 hex digits, e.g. 01".into()),
            });
        }

        // ── Device socket ───
        if let Some(socket) = &self.discovery.device_socket {
            if socket.starts_with('@') {
                warnings.push(ConfigWarning {
                    field: "discovery.device_socket".into(),
                    message: format!("'{socket}' includes the leading '@'"),
                    severity: WarningSeverity::Error,
                    hint: Some(format!("Use '{}'", socket.trim_start_matches('@'))),
                });
            }
            if !self.discovery.chrome_session && socket == "chrome_devtools_remote" {
                warnings.push(ConfigWarning {
                    field: "discovery.device_socket".into(),
                    message: "embedded Chromium socket selected; only CHROMIUM will be listed".into(),
                    severity: WarningSeverity::Info,
                    hint: None,
                });
            }
        }

        // ── Details ───
        if !self.discovery.ensure_webviews_have_pages && !self.discovery.enable_details_collection {
            warnings.push(ConfigWarning {
                field: "discovery".into(),
                message: "details collection and page checks are both off".into(),
                severity: WarningSeverity::Info,
                hint: Some("Chromedriver may attach to a webview that serves no pages".into()),
            });
        }

        // ── Lock ───
        if self.port_guard.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                field: "port_guard.timeout_secs".into(),
                message: "lock timeout is 0: concurrent sessions will fail immediately".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set to e.g. 7".into()),
            });
        }

        // ── Logging ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        // Check for hard errors
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
