//! Local port allocation and devtools socket forwarding.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use wvscout_config::ScoutConfig;
use wvscout_core::ScoutError;

use crate::channel::DeviceChannel;
use crate::guard::{FileLockGuard, PortGuard};

/// Picks free local ports inside a window, one guarded scan at a time.
///
/// Ports handed out but not yet released are remembered in-process, so two
/// concurrent collections never get the same port even though the `adb
/// forward` itself happens after the guard is released.
pub struct PortAllocator {
    guard: Arc<dyn PortGuard>,
    reserved: Mutex<HashSet<u16>>,
    base_port: u16,
    window: u16,
}

/// A forwarded local port. Pass it back to [`PortAllocator::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortForward {
    pub local_port: u16,
    pub remote_socket: String,
}

impl PortAllocator {
    pub fn new(guard: Arc<dyn PortGuard>, base_port: u16, window: u16) -> Self {
        Self {
            guard,
            reserved: Mutex::new(HashSet::new()),
            base_port,
            window,
        }
    }

    /// Allocator using the host-wide file lock from config.
    pub fn from_config(config: &ScoutConfig) -> Self {
        Self::new(
            Arc::new(FileLockGuard::new(&config.port_guard)),
            config.port_guard.base_port,
            config.port_guard.port_window,
        )
    }

    /// Scan `[start, start + window)` for a port that is neither reserved here
    /// nor bound by anyone on the host, and reserve it. A start of 0 counts
    /// as unset.
    pub async fn reserve(&self, start_port: Option<u16>) -> wvscout_core::Result<u16> {
        let start = start_port.filter(|p| *p != 0).unwrap_or(self.base_port);
        let end = start.saturating_add(self.window);

        let _lease = self.guard.acquire().await?;
        for port in start..end {
            if self.reserved.lock().contains(&port) {
                continue;
            }
            if is_port_free(port).await {
                self.reserved.lock().insert(port);
                debug!(port, "reserved local devtools port");
                return Ok(port);
            }
        }
        Err(ScoutError::NoFreePort { start, end })
    }

    /// Reserve a port and forward it to the abstract socket `proc` (`@` optional).
    ///
    /// On forward failure the reservation is dropped and the (possibly
    /// half-created) forward is removed before returning the error.
    pub async fn forward(
        &self,
        device: &dyn DeviceChannel,
        proc: &str,
        start_port: Option<u16>,
    ) -> wvscout_core::Result<PortForward> {
        let local_port = self.reserve(start_port).await?;
        let remote_socket = proc.strip_prefix('@').unwrap_or(proc).to_string();

        debug!(local_port, %remote_socket, "forwarding devtools socket");
        let forward = PortForward {
            local_port,
            remote_socket,
        };
        if let Err(e) = device
            .forward_port(forward.local_port, &forward.remote_socket)
            .await
        {
            self.release(device, forward).await;
            return Err(e);
        }
        Ok(forward)
    }

    /// Remove the forward and give the port back. Never fails.
    pub async fn release(&self, device: &dyn DeviceChannel, forward: PortForward) {
        if let Err(e) = device.remove_port_forward(forward.local_port).await {
            warn!(port = forward.local_port, error = %e, "could not remove port forward");
        }
        self.reserved.lock().remove(&forward.local_port);
    }

    /// Number of ports currently handed out.
    pub fn reserved_count(&self) -> usize {
        self.reserved.lock().len()
    }
}

async fn is_port_free(port: u16) -> bool {
    tokio::net::TcpListener::bind(("127.0.0.1", port)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::LocalGuard;

    async fn free_window(len: u16) -> u16 {
        // Find a run of unbound ports in the high range for this test.
        'outer: for start in (40000..60000).step_by(len as usize + 7) {
            for port in start..start + len {
                if !is_port_free(port).await {
                    continue 'outer;
                }
            }
            return start;
        }
        panic!("no free port window on this host");
    }

    #[tokio::test]
    async fn test_reserve_hands_out_distinct_ports() {
        let start = free_window(3).await;
        let alloc = PortAllocator::new(Arc::new(LocalGuard::default()), start, 3);
        let a = alloc.reserve(None).await.unwrap();
        let b = alloc.reserve(None).await.unwrap();
        assert_ne!(a, b);
        assert!((start..start + 3).contains(&a));
        assert_eq!(alloc.reserved_count(), 2);
    }

    #[tokio::test]
    async fn test_reserve_skips_bound_port() {
        let start = free_window(2).await;
        let _held = std::net::TcpListener::bind(("127.0.0.1", start)).unwrap();
        let alloc = PortAllocator::new(Arc::new(LocalGuard::default()), start, 2);
        assert_eq!(alloc.reserve(None).await.unwrap(), start + 1);
    }

    #[tokio::test]
    async fn test_exhausted_window_names_range() {
        let start = free_window(1).await;
        let alloc = PortAllocator::new(Arc::new(LocalGuard::default()), start, 1);
        alloc.reserve(None).await.unwrap();
        let err = alloc.reserve(None).await.unwrap_err();
        assert!(matches!(err, ScoutError::NoFreePort { .. }));
        assert!(err.to_string().contains(&format!("in range {}..{}", start, start + 1)));
    }

    #[tokio::test]
    async fn test_explicit_start_port_overrides_base() {
        let start = free_window(2).await;
        let alloc = PortAllocator::new(Arc::new(LocalGuard::default()), 1, 2);
        assert_eq!(alloc.reserve(Some(start)).await.unwrap(), start);
    }

    #[tokio::test]
    async fn test_zero_start_port_falls_back_to_base() {
        let start = free_window(2).await;
        let alloc = PortAllocator::new(Arc::new(LocalGuard::default()), start, 2);
        assert_eq!(alloc.reserve(Some(0)).await.unwrap(), start);
    }
}
