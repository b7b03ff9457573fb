//! The discovery pipeline.
//!
//! ```text
//! cat /proc/net/unix → parse → classify → resolve process → collect details → cache
//! ```
//!
//! Each stage returns a new collection; candidates a stage gives up on are
//! moved into [`DiscoveryReport::degraded`] instead of being mutated in place.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wvscout_config::DiscoveryConfig;
use wvscout_core::{
    CHROMIUM_WIN, DegradedCandidate, Degradation, Outcome, ScoutError, WebviewDetails,
    WebviewEntry,
};

use crate::cache::DetailsCache;
use crate::channel::DeviceChannel;
use crate::classify::{SocketKind, classify_sockets};
use crate::devtools::DevToolsProbe;
use crate::ports::PortAllocator;
use crate::process::{keep_provisional_name, resolve_process};
use crate::sockets::{ListeningPattern, parse_socket_table};

const WEBVIEW_WAIT_INTERVAL: Duration = Duration::from_millis(200);

// ─── Types ──────────────────────────────────────────────────────

/// Per-run discovery settings.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Explicit abstract socket to look at, without `@`.
    pub device_socket: Option<String>,
    pub ensure_webviews_have_pages: bool,
    pub enable_details_collection: bool,
    pub devtools_port: Option<u16>,
    pub wait_for_webview: Duration,
    pub chrome_session: bool,
    pub port_exhaustion_fatal: bool,
    pub listening: ListeningPattern,
}

impl From<&DiscoveryConfig> for DiscoveryOptions {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            device_socket: config.device_socket.clone().filter(|s| !s.is_empty()),
            ensure_webviews_have_pages: config.ensure_webviews_have_pages,
            enable_details_collection: config.enable_details_collection,
            devtools_port: config.devtools_port,
            wait_for_webview: Duration::from_millis(config.wait_for_webview_ms),
            chrome_session: config.chrome_session,
            port_exhaustion_fatal: config.port_exhaustion_fatal,
            listening: ListeningPattern {
                flags: config.listening_flags.clone(),
                state: config.listening_state.clone(),
            },
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from(&DiscoveryConfig::default())
    }
}

/// Output of one discovery run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Named webviews, in socket table order.
    pub entries: Vec<WebviewEntry>,
    /// Candidates dropped, and entries left without some detail.
    pub degraded: Vec<DegradedCandidate>,
}

// ─── Resolver ───────────────────────────────────────────────────

/// Runs discovery against one device.
pub struct ContextResolver {
    device: Arc<dyn DeviceChannel>,
    probe: Arc<dyn DevToolsProbe>,
    allocator: Arc<PortAllocator>,
    cache: Arc<DetailsCache>,
}

impl ContextResolver {
    pub fn new(
        device: Arc<dyn DeviceChannel>,
        probe: Arc<dyn DevToolsProbe>,
        allocator: Arc<PortAllocator>,
        cache: Arc<DetailsCache>,
    ) -> Self {
        Self {
            device,
            probe,
            allocator,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<DetailsCache> {
        &self.cache
    }

    /// Find every webview on the device and refresh the details cache.
    ///
    /// Finding nothing is not an error. The only per-candidate failure that
    /// aborts the run is port exhaustion with `port_exhaustion_fatal` set.
    pub async fn discover(&self, opts: &DiscoveryOptions) -> wvscout_core::Result<DiscoveryReport> {
        debug!("getting a list of available webviews");
        let (candidates, mut degraded) = self.candidates(opts).await?;

        let resolved = self.resolve_names(candidates, opts, &mut degraded).await;
        let entries = self.collect_details(resolved, opts, &mut degraded).await?;

        for entry in &entries {
            self.update_cache(entry);
        }
        Ok(DiscoveryReport { entries, degraded })
    }

    /// Cached details for a context on this device.
    pub fn webview_details(&self, webview_name: &str) -> Option<WebviewDetails> {
        self.cache
            .get(&DetailsCache::key(self.device.device_id(), webview_name))
    }

    /// Parse and classify, polling until a candidate shows up or the wait elapses.
    async fn candidates(
        &self,
        opts: &DiscoveryOptions,
    ) -> wvscout_core::Result<(Vec<(WebviewEntry, SocketKind)>, Vec<DegradedCandidate>)> {
        let started = Instant::now();
        loop {
            let raw = self.device.shell(&["cat", "/proc/net/unix"]).await?;
            let table = parse_socket_table(&raw, &opts.listening);
            let (found, dropped) = classify_sockets(&table.listening, opts.device_socket.as_deref());

            if !found.is_empty() || started.elapsed() >= opts.wait_for_webview {
                debug!(candidates = found.len(), dropped = dropped.len(), "classified sockets");
                return Ok((found, dropped));
            }
            tokio::time::sleep(WEBVIEW_WAIT_INTERVAL).await;
        }
    }

    async fn resolve_names(
        &self,
        candidates: Vec<(WebviewEntry, SocketKind)>,
        opts: &DiscoveryOptions,
        degraded: &mut Vec<DegradedCandidate>,
    ) -> Vec<WebviewEntry> {
        let mut resolved = Vec::with_capacity(candidates.len());
        for (entry, kind) in candidates {
            // An explicitly requested socket is unambiguous already.
            if opts.device_socket.is_some() {
                resolved.push(keep_provisional_name(entry));
                continue;
            }
            let proc = entry.proc.clone();
            match resolve_process(self.device.as_ref(), entry, &kind).await {
                Outcome::Ok(entry) => resolved.push(entry),
                Outcome::Degraded(reason) => degraded.push(DegradedCandidate { proc, reason }),
            }
        }
        resolved
    }

    async fn collect_details(
        &self,
        entries: Vec<WebviewEntry>,
        opts: &DiscoveryOptions,
        degraded: &mut Vec<DegradedCandidate>,
    ) -> wvscout_core::Result<Vec<WebviewEntry>> {
        if !opts.ensure_webviews_have_pages {
            info!("not checking whether webviews have active pages");
        }
        if !opts.enable_details_collection {
            info!("not collecting webview details");
        }
        if entries.is_empty() || (!opts.ensure_webviews_have_pages && !opts.enable_details_collection)
        {
            return Ok(entries);
        }

        debug!(count = entries.len(), "collecting CDP data");
        let results = join_all(entries.into_iter().map(|e| self.collect_one(e, opts))).await;
        debug!("CDP data collection completed");

        let mut collected = Vec::with_capacity(results.len());
        for result in results {
            let (entry, problems) = result?;
            degraded.extend(problems.into_iter().map(|reason| DegradedCandidate {
                proc: entry.proc.clone(),
                reason,
            }));
            collected.push(entry);
        }
        Ok(collected)
    }

    /// Forward, probe, unforward. Only fatal port exhaustion is an `Err`.
    async fn collect_one(
        &self,
        mut entry: WebviewEntry,
        opts: &DiscoveryOptions,
    ) -> wvscout_core::Result<(WebviewEntry, Vec<Degradation>)> {
        let device = self.device.as_ref();
        let forward = match self
            .allocator
            .forward(device, &entry.proc, opts.devtools_port)
            .await
        {
            Ok(forward) => forward,
            Err(e @ ScoutError::NoFreePort { .. }) if opts.port_exhaustion_fatal => return Err(e),
            Err(e) => {
                let reason = e.to_string();
                let problem = match e {
                    ScoutError::Adb { .. } | ScoutError::AdbTimeout { .. } => {
                        debug!(proc = %entry.proc, error = %reason, "port forward failed");
                        Degradation::ForwardFailed { reason }
                    }
                    _ => {
                        warn!(proc = %entry.proc, error = %reason, "cannot allocate devtools port");
                        Degradation::PortAllocation { reason }
                    }
                };
                return Ok((entry, vec![problem]));
            }
        };

        let host = device.forward_host();
        let port = forward.local_port;
        let (info, pages) = tokio::join!(
            async {
                if opts.enable_details_collection {
                    Some(self.probe.version(host, port).await)
                } else {
                    None
                }
            },
            async {
                if opts.ensure_webviews_have_pages {
                    Some(self.probe.list(host, port).await)
                } else {
                    None
                }
            },
        );
        self.allocator.release(device, forward).await;

        let mut problems = Vec::new();
        match info {
            Some(Ok(info)) => entry.info = Some(info),
            Some(Err(e)) => problems.push(probe_failed(&entry, "/json/version", e)),
            None => {}
        }
        match pages {
            Some(Ok(pages)) => entry.pages = Some(pages),
            Some(Err(e)) => problems.push(probe_failed(&entry, "/json/list", e)),
            None => {}
        }
        Ok((entry, problems))
    }

    fn update_cache(&self, entry: &WebviewEntry) {
        let Some(name) = entry.webview_name.as_deref() else {
            return;
        };
        let key = DetailsCache::key(self.device.device_id(), name);
        let details = WebviewDetails {
            info: entry.info.clone(),
            process: entry.process.clone(),
        };
        if !details.is_empty() {
            self.cache.set(key, details);
        } else if self.cache.delete(&key) {
            debug!(%key, "dropped stale webview details");
        }
    }
}

fn probe_failed(entry: &WebviewEntry, endpoint: &str, e: ScoutError) -> Degradation {
    debug!(proc = %entry.proc, endpoint, error = %e, "devtools probe failed");
    Degradation::ProbeFailed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

/// Public context names of a discovery run.
///
/// Entries whose page list was fetched and came back empty are skipped when
/// `ensure_webviews_have_pages` is set; a missing list keeps the entry.
pub fn webview_names(report: &DiscoveryReport, opts: &DiscoveryOptions) -> Vec<String> {
    if opts.chrome_session {
        return vec![CHROMIUM_WIN.to_string()];
    }

    let mut names = Vec::new();
    for entry in &report.entries {
        if opts.ensure_webviews_have_pages && entry.has_zero_pages() {
            info!(webview = %entry.webview, proc = %entry.proc,
                "skipping webview since it has reported having zero pages");
            continue;
        }
        if let Some(name) = &entry.webview_name {
            names.push(name.clone());
        }
    }
    debug!(count = names.len(), ?names, "found webviews");
    names
}
