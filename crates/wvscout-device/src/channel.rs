//! The device command channel consumed by discovery.

use async_trait::async_trait;

/// Everything discovery needs from a device connection.
///
/// [`crate::AdbBridge`] is the production implementation;
/// [`crate::mock::MockDevice`] is a scripted one for tests.
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    /// Identifier of the targeted device, used to namespace cached details.
    fn device_id(&self) -> Option<&str>;

    /// Host on which forwarded local ports are reachable.
    fn forward_host(&self) -> &str {
        "127.0.0.1"
    }

    /// Run a shell command on the device and return its stdout.
    async fn shell(&self, args: &[&str]) -> wvscout_core::Result<String>;

    /// Bind `tcp:<local_port>` on the host to `localabstract:<remote_socket>`.
    async fn forward_port(&self, local_port: u16, remote_socket: &str) -> wvscout_core::Result<()>;

    /// Remove a forward created by [`DeviceChannel::forward_port`].
    async fn remove_port_forward(&self, local_port: u16) -> wvscout_core::Result<()>;

    /// Look up the process name owning `pid`.
    async fn name_by_pid(&self, pid: u32) -> wvscout_core::Result<String>;
}
