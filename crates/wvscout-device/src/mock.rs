//! Scripted device and DevTools doubles for deterministic testing.
//!
//! No adb, no network: the device replays canned `/proc/net/unix` dumps and a
//! pid table, and the probe answers from per-socket scripts. Every forward and
//! unforward is recorded for assertions.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use wvscout_core::{DevToolsPage, DevToolsVersionInfo, ScoutError};

use crate::channel::DeviceChannel;
use crate::devtools::DevToolsProbe;

type ForwardTable = Arc<Mutex<HashMap<u16, String>>>;

/// A mock device channel.
///
/// # Example
/// ```
/// use wvscout_device::mock::MockDevice;
/// let device = MockDevice::new("emulator-5554")
///     .with_socket_table("0: 00000002 00000000 00010000 0001 01 1 @webview_devtools_remote_42")
///     .with_process(42, "com.example.app");
/// ```
pub struct MockDevice {
    device_id: Option<String>,
    socket_tables: Mutex<VecDeque<String>>,
    processes: HashMap<u32, String>,
    failing_forwards: HashSet<String>,
    active: ForwardTable,
    /// Every `(local_port, remote_socket)` forward attempted, in order.
    pub forwards: Arc<Mutex<Vec<(u16, String)>>>,
    /// Every local port whose forward removal was requested, in order.
    pub removals: Arc<Mutex<Vec<u16>>>,
    /// Every shell command run, joined with spaces.
    pub shell_calls: Arc<Mutex<Vec<String>>>,
}

impl MockDevice {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: Some(device_id.to_string()),
            socket_tables: Mutex::new(VecDeque::new()),
            processes: HashMap::new(),
            failing_forwards: HashSet::new(),
            active: Arc::new(Mutex::new(HashMap::new())),
            forwards: Arc::new(Mutex::new(Vec::new())),
            removals: Arc::new(Mutex::new(Vec::new())),
            shell_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a `/proc/net/unix` dump. Dumps are served in order; the last one
    /// repeats forever.
    pub fn with_socket_table(self, raw: &str) -> Self {
        self.socket_tables.lock().push_back(raw.to_string());
        self
    }

    /// Register a process for pid lookups.
    pub fn with_process(mut self, pid: u32, name: &str) -> Self {
        self.processes.insert(pid, name.to_string());
        self
    }

    /// Make `adb forward` to this socket (`@` optional) fail.
    pub fn with_failing_forward(mut self, socket: &str) -> Self {
        self.failing_forwards.insert(bare(socket).to_string());
        self
    }

    /// Forwards currently in place.
    pub fn active_forwards(&self) -> HashMap<u16, String> {
        self.active.lock().clone()
    }

    fn forward_table(&self) -> ForwardTable {
        self.active.clone()
    }
}

#[async_trait]
impl DeviceChannel for MockDevice {
    fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    async fn shell(&self, args: &[&str]) -> wvscout_core::Result<String> {
        let command = args.join(" ");
        self.shell_calls.lock().push(command.clone());
        if command != "cat /proc/net/unix" {
            return Err(ScoutError::Adb {
                command,
                reason: "not scripted".into(),
            });
        }
        let mut tables = self.socket_tables.lock();
        let raw = if tables.len() > 1 {
            tables.pop_front()
        } else {
            tables.front().cloned()
        };
        Ok(raw.unwrap_or_default())
    }

    async fn forward_port(&self, local_port: u16, remote_socket: &str) -> wvscout_core::Result<()> {
        self.forwards
            .lock()
            .push((local_port, remote_socket.to_string()));
        if self.failing_forwards.contains(remote_socket) {
            return Err(ScoutError::Adb {
                command: format!("forward tcp:{local_port} localabstract:{remote_socket}"),
                reason: "cannot bind listener".into(),
            });
        }
        self.active.lock().insert(local_port, remote_socket.to_string());
        Ok(())
    }

    async fn remove_port_forward(&self, local_port: u16) -> wvscout_core::Result<()> {
        self.removals.lock().push(local_port);
        self.active.lock().remove(&local_port);
        Ok(())
    }

    async fn name_by_pid(&self, pid: u32) -> wvscout_core::Result<String> {
        self.processes
            .get(&pid)
            .cloned()
            .ok_or(ScoutError::ProcessNotFound(pid))
    }
}

/// A mock DevTools probe that answers based on which socket a port is
/// forwarded to on the paired [`MockDevice`].
pub struct MockProbe {
    forwards: ForwardTable,
    versions: HashMap<String, DevToolsVersionInfo>,
    pages: HashMap<String, Vec<DevToolsPage>>,
    failing: HashSet<String>,
    /// Every `(endpoint, remote_socket)` request received.
    pub requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockProbe {
    pub fn for_device(device: &MockDevice) -> Self {
        Self {
            forwards: device.forward_table(),
            versions: HashMap::new(),
            pages: HashMap::new(),
            failing: HashSet::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_version(mut self, socket: &str, info: DevToolsVersionInfo) -> Self {
        self.versions.insert(bare(socket).to_string(), info);
        self
    }

    pub fn with_pages(mut self, socket: &str, pages: Vec<DevToolsPage>) -> Self {
        self.pages.insert(bare(socket).to_string(), pages);
        self
    }

    /// Every request for this socket fails.
    pub fn with_failure(mut self, socket: &str) -> Self {
        self.failing.insert(bare(socket).to_string());
        self
    }

    fn target(&self, endpoint: &str, port: u16) -> wvscout_core::Result<String> {
        let url = format!("http://127.0.0.1:{port}{endpoint}");
        let socket = self
            .forwards
            .lock()
            .get(&port)
            .cloned()
            .ok_or_else(|| ScoutError::DevTools {
                url: url.clone(),
                reason: "connection refused".into(),
            })?;
        self.requests
            .lock()
            .push((endpoint.to_string(), socket.clone()));
        if self.failing.contains(&socket) {
            return Err(ScoutError::DevTools {
                url,
                reason: "timeout of 2000ms exceeded".into(),
            });
        }
        Ok(socket)
    }
}

#[async_trait]
impl DevToolsProbe for MockProbe {
    async fn version(&self, _host: &str, port: u16) -> wvscout_core::Result<DevToolsVersionInfo> {
        let socket = self.target("/json/version", port)?;
        self.versions
            .get(&socket)
            .cloned()
            .ok_or_else(|| ScoutError::DevTools {
                url: format!("http://127.0.0.1:{port}/json/version"),
                reason: "HTTP 404 Not Found".into(),
            })
    }

    async fn list(&self, _host: &str, port: u16) -> wvscout_core::Result<Vec<DevToolsPage>> {
        let socket = self.target("/json/list", port)?;
        self.pages
            .get(&socket)
            .cloned()
            .ok_or_else(|| ScoutError::DevTools {
                url: format!("http://127.0.0.1:{port}/json/list"),
                reason: "HTTP 404 Not Found".into(),
            })
    }
}

fn bare(socket: &str) -> &str {
    socket.strip_prefix('@').unwrap_or(socket)
}
