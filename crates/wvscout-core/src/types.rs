use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context name of the native application surface.
pub const NATIVE_WIN: &str = "NATIVE_APP";
/// Bare web context name; resolves to the default webview of the session.
pub const WEBVIEW_WIN: &str = "WEBVIEW";
/// Fixed context name of an embedded Chromium browser.
pub const CHROMIUM_WIN: &str = "CHROMIUM";
/// Prefix shared by every webview context name.
pub const WEBVIEW_BASE: &str = "WEBVIEW_";

/// OS process that owns a webview devtools socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Package / process name.
    pub name: String,
    /// PID, when the context name was derived from one.
    pub id: Option<String>,
}

/// Payload of `GET /json/version`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevToolsVersionInfo {
    #[serde(rename = "Browser", default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(rename = "Protocol-Version", default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(rename = "User-Agent", default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(rename = "V8-Version", default, skip_serializing_if = "Option::is_none")]
    pub v8_version: Option<String>,
    #[serde(rename = "WebKit-Version", default, skip_serializing_if = "Option::is_none")]
    pub webkit_version: Option<String>,
    /// Only reported by Android builds of Chromium.
    #[serde(rename = "Android-Package", default, skip_serializing_if = "Option::is_none")]
    pub android_package: Option<String>,
    #[serde(rename = "webSocketDebuggerUrl", default, skip_serializing_if = "Option::is_none")]
    pub web_socket_debugger_url: Option<String>,
    /// Anything else the endpoint reported.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of `GET /json/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevToolsPage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub page_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtools_frontend_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_socket_debugger_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
}

/// A webview found during one discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebviewEntry {
    /// Raw abstract socket name, always `@`-prefixed.
    pub proc: String,
    /// Context key derived from the socket naming convention alone.
    pub webview: String,
    /// Final context name exposed to callers. `None` is never surfaced.
    pub webview_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<DevToolsVersionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<DevToolsPage>>,
}

impl WebviewEntry {
    pub fn new(proc: impl Into<String>, webview: impl Into<String>) -> Self {
        Self {
            proc: proc.into(),
            webview: webview.into(),
            webview_name: None,
            process: None,
            info: None,
            pages: None,
        }
    }

    /// True when pages were collected and none were reported.
    pub fn has_zero_pages(&self) -> bool {
        self.pages.as_ref().is_some_and(|p| p.is_empty())
    }
}

/// Last known metadata for a context, kept between discovery runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebviewDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<DevToolsVersionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessInfo>,
}

impl WebviewDetails {
    pub fn is_empty(&self) -> bool {
        self.info.is_none() && self.process.is_none()
    }
}
