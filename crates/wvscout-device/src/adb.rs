//! Android device access via ADB (Android Debug Bridge).
//!
//! Provides discovery with the handful of device primitives it needs:
//! - List connected devices
//! - Run shell commands on the device
//! - Forward / unforward a local TCP port to an abstract socket
//! - Resolve a PID to its process name
//!
//! # Requirements
//!
//! ADB must be installed and on PATH (or `device.adb_path` set). On macOS:
//! `brew install android-platform-tools`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use wvscout_config::DeviceConfig;
use wvscout_core::ScoutError;

use crate::channel::DeviceChannel;
use crate::process::find_name_by_pid;

// ─── Types ──────────────────────────────────────────────────────

/// Info about a connected Android device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndroidDevice {
    pub serial: String,
    pub state: String,
    pub model: Option<String>,
    pub android_version: Option<String>,
}

// ─── ADB Bridge ──────────────────────────────────────────────────

/// Android Debug Bridge interface.
pub struct AdbBridge {
    adb_path: String,
    /// The serial of the active device (None = auto-select single device).
    active_device: Option<String>,
    forward_host: String,
    timeout: Duration,
}

impl Default for AdbBridge {
    fn default() -> Self {
        Self::new(&DeviceConfig::default())
    }
}

impl AdbBridge {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            adb_path: config.adb_path.clone(),
            active_device: config.serial.clone(),
            forward_host: config.adb_host.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }

    /// Run an ADB command against the active device and return stdout.
    async fn adb(&self, args: &[&str]) -> wvscout_core::Result<String> {
        self.adb_on(self.active_device.as_deref(), args).await
    }

    /// Run an ADB command against `serial` and return stdout.
    async fn adb_on(&self, serial: Option<&str>, args: &[&str]) -> wvscout_core::Result<String> {
        let mut cmd = tokio::process::Command::new(&self.adb_path);

        // Target specific device if set
        if let Some(serial) = serial {
            cmd.arg("-s").arg(serial);
        }

        for arg in args {
            cmd.arg(arg);
        }

        let command = args.join(" ");
        debug!(%command, "running adb");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ScoutError::AdbTimeout {
                command: command.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ScoutError::Adb {
                command: command.clone(),
                reason: format!(
                    "adb not found or failed: {e}. Install with: brew install android-platform-tools"
                ),
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ScoutError::Adb {
                command,
                reason: stderr.trim().to_string(),
            })
        }
    }

    // ── Public API ─────────────────────────────────────────────

    /// List connected Android devices.
    pub async fn list_devices(&self) -> wvscout_core::Result<Vec<AndroidDevice>> {
        let output = self.adb_on(None, &["devices", "-l"]).await?;
        let mut devices = parse_device_list(&output);

        // Fetch Android version for connected devices
        for device in &mut devices {
            if device.state == "device"
                && let Ok(ver) = self
                    .adb_on(
                        Some(device.serial.as_str()),
                        &["shell", "getprop", "ro.build.version.release"],
                    )
                    .await
            {
                device.android_version = Some(ver.trim().to_string());
            }
        }

        Ok(devices)
    }
}

#[async_trait]
impl DeviceChannel for AdbBridge {
    fn device_id(&self) -> Option<&str> {
        self.active_device.as_deref()
    }

    fn forward_host(&self) -> &str {
        &self.forward_host
    }

    async fn shell(&self, args: &[&str]) -> wvscout_core::Result<String> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        self.adb(&full).await
    }

    async fn forward_port(&self, local_port: u16, remote_socket: &str) -> wvscout_core::Result<()> {
        let local = format!("tcp:{local_port}");
        let remote = format!("localabstract:{remote_socket}");
        self.adb(&["forward", &local, &remote]).await?;
        Ok(())
    }

    async fn remove_port_forward(&self, local_port: u16) -> wvscout_core::Result<()> {
        let local = format!("tcp:{local_port}");
        self.adb(&["forward", "--remove", &local]).await?;
        Ok(())
    }

    async fn name_by_pid(&self, pid: u32) -> wvscout_core::Result<String> {
        // Toybox `ps` (Android 8+) hides other users' processes unless -A is given;
        // older toolbox `ps` rejects -A, so fall back to the bare command.
        if let Ok(out) = self.shell(&["ps", "-A"]).await
            && out.lines().count() > 1
        {
            return find_name_by_pid(&out, pid);
        }
        let out = self.shell(&["ps"]).await?;
        find_name_by_pid(&out, pid)
    }
}

/// Parse the output of `adb devices -l`.
pub fn parse_device_list(output: &str) -> Vec<AndroidDevice> {
    let mut devices = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('*') || line.starts_with("List of devices") {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 2 {
            // Extract model from device info
            let model = parts
                .iter()
                .find_map(|p| p.strip_prefix("model:"))
                .map(str::to_string);

            devices.push(AndroidDevice {
                serial: parts[0].to_string(),
                state: parts[1].to_string(),
                model,
                android_version: None,
            });
        }
    }

    devices
}
