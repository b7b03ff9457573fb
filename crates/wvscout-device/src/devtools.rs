//! DevTools HTTP endpoint probing.
//!
//! Only the two discovery endpoints are used: `/json/version` for the
//! browser metadata and `/json/list` for the open pages.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use wvscout_core::{DevToolsPage, DevToolsVersionInfo, ScoutError};

/// Fetches DevTools metadata from a forwarded port.
#[async_trait]
pub trait DevToolsProbe: Send + Sync {
    async fn version(&self, host: &str, port: u16) -> wvscout_core::Result<DevToolsVersionInfo>;

    async fn list(&self, host: &str, port: u16) -> wvscout_core::Result<Vec<DevToolsPage>>;
}

/// reqwest-backed probe.
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> wvscout_core::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            // Each forward is short-lived; a pooled connection would outlive it.
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ScoutError::DevTools {
                url: String::new(),
                reason: format!("cannot build http client: {e}"),
            })?;
        Ok(Self { http })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> wvscout_core::Result<T> {
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ScoutError::DevTools {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScoutError::DevTools {
                url,
                reason: format!("HTTP {status}"),
            });
        }

        resp.json().await.map_err(|e| ScoutError::DevTools {
            url,
            reason: format!("invalid response body: {e}"),
        })
    }
}

#[async_trait]
impl DevToolsProbe for HttpProbe {
    async fn version(&self, host: &str, port: u16) -> wvscout_core::Result<DevToolsVersionInfo> {
        self.get_json(format!("http://{host}:{port}/json/version")).await
    }

    async fn list(&self, host: &str, port: u16) -> wvscout_core::Result<Vec<DevToolsPage>> {
        self.get_json(format!("http://{host}:{port}/json/list")).await
    }
}
