//! Chromedriver capability composition for a selected webview.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use wvscout_core::WebviewDetails;

use crate::contexts::{CHROME_PACKAGE_NAME, KNOWN_CHROME_PACKAGE_NAMES};

/// Caller-supplied session settings that shape the Chromedriver config.
///
/// Field names follow the capability names callers already use, so an
/// overrides file can be a plain capability JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CapabilityOverrides {
    /// Raw `chromeOptions`; keys not computed here are passed through.
    pub chrome_options: Map<String, Value>,
    pub app_package: Option<String>,
    pub app_activity: Option<String>,
    pub browser_name: Option<String>,
    pub chrome_use_running_app: Option<bool>,
    pub chrome_android_package: Option<String>,
    pub chrome_android_activity: Option<String>,
    pub chrome_android_process: Option<String>,
    pub page_load_strategy: Option<String>,
    /// Deprecated alias of `chrome_logging_prefs`.
    pub logging_prefs: Option<Map<String, Value>>,
    pub chrome_logging_prefs: Option<Map<String, Value>>,
    /// Deprecated; same as `chromeLoggingPrefs: {performance: ALL}`.
    pub enable_performance_logging: bool,
}

/// Config handed to Chromedriver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromedriverCaps {
    pub chrome_options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_load_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_prefs: Option<Map<String, Value>>,
}

impl ChromedriverCaps {
    fn option_str(&self, key: &str) -> Option<&str> {
        self.chrome_options.get(key).and_then(Value::as_str)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Build Chromedriver capabilities for one webview.
///
/// Computed `chromeOptions` fields are never overwritten by the raw
/// `chrome_options` passthrough; those collisions are logged and dropped.
pub fn compose_chromedriver_caps(
    overrides: &CapabilityOverrides,
    device_id: &str,
    details: Option<&WebviewDetails>,
) -> ChromedriverCaps {
    let mut caps = ChromedriverCaps::default();
    let user = &overrides.chrome_options;

    let discovered_package = details
        .and_then(|d| d.info.as_ref())
        .and_then(|i| i.android_package.as_deref());
    let android_package = user
        .get("androidPackage")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or(non_empty(&overrides.app_package))
        .or(discovered_package);
    if let Some(pkg) = android_package {
        caps.chrome_options.insert("androidPackage".into(), json!(pkg));
    }
    if let Some(use_running) = overrides.chrome_use_running_app {
        caps.chrome_options
            .insert("androidUseRunningApp".into(), json!(use_running));
    }
    if let Some(pkg) = non_empty(&overrides.chrome_android_package) {
        caps.chrome_options.insert("androidPackage".into(), json!(pkg));
    }
    if let Some(activity) = non_empty(&overrides.chrome_android_activity) {
        caps.chrome_options.insert("androidActivity".into(), json!(activity));
    }
    if let Some(process) = non_empty(&overrides.chrome_android_process) {
        caps.chrome_options.insert("androidProcess".into(), json!(process));
    } else if let Some(process) = details.and_then(|d| d.process.as_ref())
        && process.id.is_some()
        && !process.name.is_empty()
    {
        caps.chrome_options
            .insert("androidProcess".into(), json!(process.name));
    }
    if overrides
        .browser_name
        .as_deref()
        .is_some_and(|b| b.eq_ignore_ascii_case("chromium-webview"))
        && let Some(activity) = non_empty(&overrides.app_activity)
    {
        caps.chrome_options
            .entry("androidActivity")
            .or_insert_with(|| json!(activity));
    }
    caps.page_load_strategy = overrides.page_load_strategy.clone();

    // A package taken from a context name may be the bare word "chrome".
    let is_bare_chrome = caps
        .option_str("androidPackage")
        .is_some_and(|p| p.eq_ignore_ascii_case("chrome"));
    let is_known_chrome = caps
        .option_str("androidPackage")
        .is_some_and(|p| KNOWN_CHROME_PACKAGE_NAMES.contains(&p));
    if is_bare_chrome || is_known_chrome {
        if is_bare_chrome {
            caps.chrome_options
                .insert("androidPackage".into(), json!(CHROME_PACKAGE_NAME));
        }
        caps.chrome_options.remove("androidActivity");
        caps.chrome_options.remove("androidProcess");
    }

    caps.chrome_options
        .insert("androidDeviceSerial".into(), json!(device_id));

    if overrides.logging_prefs.is_some() {
        warn!("the 'loggingPrefs' cap is deprecated; use the 'chromeLoggingPrefs' cap instead");
    }
    caps.logging_prefs = overrides
        .chrome_logging_prefs
        .clone()
        .or_else(|| overrides.logging_prefs.clone());
    if overrides.enable_performance_logging {
        warn!(
            "the 'enablePerformanceLogging' cap is deprecated; use the 'chromeLoggingPrefs' \
             cap with a 'performance' key set to 'ALL' instead"
        );
        caps.logging_prefs
            .get_or_insert_with(Map::new)
            .insert("performance".into(), json!("ALL"));
    }

    let passthrough = merge_arguments(user.clone());
    debug!(chrome_options = ?caps.chrome_options, "precalculated chromedriver capabilities");

    let mut protected = Vec::new();
    for (key, value) in passthrough {
        if caps.chrome_options.contains_key(&key) {
            protected.push((key, value));
        } else {
            caps.chrome_options.insert(key, value);
        }
    }
    if !protected.is_empty() {
        info!("the following chromedriver capabilities cannot be overridden by the provided chromeOptions:");
        for (key, value) in &protected {
            info!("  {key} ({value})");
        }
    }

    caps
}

/// Fold legacy `Arguments` into `args`, keeping `args` first.
fn merge_arguments(mut options: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Array(extra)) = options.remove("Arguments") {
        let mut args = match options.remove("args") {
            Some(Value::Array(args)) => args,
            _ => Vec::new(),
        };
        args.extend(extra);
        options.insert("args".into(), Value::Array(args));
    }
    options
}
