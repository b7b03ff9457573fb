//! # wvscout-device
//!
//! Webview discovery on Android devices.
//!
//! Finds the DevTools sockets that hybrid apps, Crosswalk and Chrome expose,
//! names them as automation contexts and probes them for metadata:
//! - **Device channel**: `adb` shell, port forwarding and pid lookups
//! - **Discovery**: socket table parsing, classification, process resolution
//! - **Ports**: a host-wide guarded allocator for forwarded local ports
//! - **DevTools**: `/json/version` and `/json/list` probing
//! - **Capabilities**: Chromedriver config for a selected context
//!
//! [`ContextResolver`] ties the pieces together. Everything it talks to sits
//! behind a trait, and the `mock` module provides scripted implementations.

pub mod adb;
pub mod cache;
pub mod capabilities;
pub mod channel;
pub mod classify;
pub mod contexts;
pub mod devtools;
pub mod guard;
pub mod mock;
pub mod ports;
pub mod process;
pub mod resolver;
pub mod sockets;

pub use adb::{AdbBridge, AndroidDevice};
pub use cache::DetailsCache;
pub use capabilities::{CapabilityOverrides, ChromedriverCaps, compose_chromedriver_caps};
pub use channel::DeviceChannel;
pub use devtools::{DevToolsProbe, HttpProbe};
pub use guard::{FileLockGuard, LocalGuard, PortGuard};
pub use ports::{PortAllocator, PortForward};
pub use resolver::{ContextResolver, DiscoveryOptions, DiscoveryReport, webview_names};
