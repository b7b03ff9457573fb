//! Socket name classification.
//!
//! Chromium names its devtools sockets after whoever embeds it, see
//! `chrome/browser/devtools/device/android_device_info_query.cc`:
//!
//! - `@webview_devtools_remote_<pid>` for system WebView instances
//! - `@<package>_devtools_remote` for Crosswalk and other embedders
//! - `@chrome_devtools_remote` for Chrome itself

use regex::Regex;
use std::sync::LazyLock;
use wvscout_core::{
    CHROMIUM_WIN, DegradedCandidate, Degradation, Outcome, WEBVIEW_BASE, WebviewEntry,
};

/// Abstract socket name of an embedded Chromium browser.
pub const CHROMIUM_DEVTOOLS_SOCKET: &str = "chrome_devtools_remote";

static DEVTOOLS_SOCKET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@[\w.]+_devtools_remote_?([\w.]+_)?(\d+)?\b").expect("valid devtools pattern")
});

static CROSSWALK_SOCKET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([\w.]+)_devtools_remote\b").expect("valid crosswalk pattern")
});

/// How a socket name was recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketKind {
    /// The configured embedded-browser socket.
    Chromium,
    /// `..._devtools_remote_<pid>`; the name still needs process resolution.
    Pid(String),
    /// `<package>_devtools_remote`.
    Package(String),
}

impl SocketKind {
    /// Provisional context key for this socket.
    pub fn context_key(&self) -> String {
        match self {
            SocketKind::Chromium => CHROMIUM_WIN.to_string(),
            SocketKind::Pid(pid) => format!("{WEBVIEW_BASE}{pid}"),
            SocketKind::Package(pkg) => format!("{WEBVIEW_BASE}{pkg}"),
        }
    }
}

/// Classify one socket name (with its leading `@`).
///
/// `device_socket` is the optional explicit socket filter, without `@`.
pub fn classify_socket(socket: &str, device_socket: Option<&str>) -> Outcome<SocketKind> {
    let bare = socket.strip_prefix('@').unwrap_or(socket);

    if device_socket == Some(CHROMIUM_DEVTOOLS_SOCKET) && bare == CHROMIUM_DEVTOOLS_SOCKET {
        return Outcome::Ok(SocketKind::Chromium);
    }
    if let Some(expected) = device_socket
        && bare != expected
    {
        return Outcome::Degraded(Degradation::FilteredBySocket {
            expected: expected.to_string(),
        });
    }

    let Some(caps) = DEVTOOLS_SOCKET_PATTERN.captures(socket) else {
        return Outcome::Degraded(Degradation::Unclassified);
    };
    if let Some(pid) = caps.get(2) {
        return Outcome::Ok(SocketKind::Pid(pid.as_str().to_string()));
    }
    match CROSSWALK_SOCKET_PATTERN.captures(socket) {
        // Package names never start with a digit.
        Some(c) if !c[1].starts_with(|ch: char| ch.is_ascii_digit()) => {
            Outcome::Ok(SocketKind::Package(c[1].to_string()))
        }
        _ => Outcome::Degraded(Degradation::Unclassified),
    }
}

/// Classify every socket, keeping the matches as fresh entries.
pub fn classify_sockets(
    sockets: &[String],
    device_socket: Option<&str>,
) -> (Vec<(WebviewEntry, SocketKind)>, Vec<DegradedCandidate>) {
    let mut entries = Vec::new();
    let mut dropped = Vec::new();
    for socket in sockets {
        match classify_socket(socket, device_socket) {
            Outcome::Ok(kind) => {
                entries.push((WebviewEntry::new(socket.clone(), kind.context_key()), kind));
            }
            Outcome::Degraded(reason) => dropped.push(DegradedCandidate {
                proc: socket.clone(),
                reason,
            }),
        }
    }
    (entries, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(socket: &str, filter: Option<&str>) -> Option<String> {
        match classify_socket(socket, filter) {
            Outcome::Ok(kind) => Some(kind.context_key()),
            Outcome::Degraded(_) => None,
        }
    }

    #[test]
    fn test_pid_suffixed_socket() {
        assert_eq!(
            classify_socket("@webview_devtools_remote_123", None),
            Outcome::Ok(SocketKind::Pid("123".into()))
        );
        assert_eq!(key("@webview_devtools_remote_123", None).as_deref(), Some("WEBVIEW_123"));
    }

    #[test]
    fn test_pid_suffixed_socket_with_infix() {
        assert_eq!(
            key("@com.example_devtools_remote_sandboxed_4567", None).as_deref(),
            Some("WEBVIEW_4567")
        );
    }

    #[test]
    fn test_package_suffixed_socket() {
        assert_eq!(
            classify_socket("@com.example.xwalk_devtools_remote", None),
            Outcome::Ok(SocketKind::Package("com.example.xwalk".into()))
        );
    }

    #[test]
    fn test_package_with_leading_digit_is_discarded() {
        assert_eq!(
            classify_socket("@1password_devtools_remote", None),
            Outcome::Degraded(Degradation::Unclassified)
        );
    }

    #[test]
    fn test_chrome_socket_without_filter_is_a_package() {
        assert_eq!(key("@chrome_devtools_remote", None).as_deref(), Some("WEBVIEW_chrome"));
    }

    #[test]
    fn test_chrome_socket_with_filter_is_chromium() {
        assert_eq!(
            classify_socket("@chrome_devtools_remote", Some(CHROMIUM_DEVTOOLS_SOCKET)),
            Outcome::Ok(SocketKind::Chromium)
        );
    }

    #[test]
    fn test_filter_discards_other_sockets() {
        let out = classify_socket("@webview_devtools_remote_123", Some("my_app_devtools_remote"));
        assert!(matches!(out, Outcome::Degraded(Degradation::FilteredBySocket { .. })));
    }

    #[test]
    fn test_filter_match_keeps_naming_convention() {
        assert_eq!(
            key("@my.app_devtools_remote", Some("my.app_devtools_remote")).as_deref(),
            Some("WEBVIEW_my.app")
        );
    }

    #[test]
    fn test_unrelated_socket_is_unclassified() {
        assert_eq!(
            classify_socket("@jdwp-control", None),
            Outcome::Degraded(Degradation::Unclassified)
        );
        assert_eq!(
            classify_socket("@webview_devtools_remote_abc_", None),
            Outcome::Degraded(Degradation::Unclassified)
        );
    }

    #[test]
    fn test_classify_sockets_yields_exactly_three_keys() {
        let sockets = vec![
            "@webview_devtools_remote_123".to_string(),
            "@com.example.xwalk_devtools_remote".to_string(),
            "@chrome_devtools_remote".to_string(),
            "@jdwp-control".to_string(),
        ];
        let (entries, dropped) = classify_sockets(&sockets, None);
        let keys: Vec<&str> = entries.iter().map(|(e, _)| e.webview.as_str()).collect();
        assert_eq!(keys, vec!["WEBVIEW_123", "WEBVIEW_com.example.xwalk", "WEBVIEW_chrome"]);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].proc, "@jdwp-control");

        let (entries, dropped) = classify_sockets(&sockets, Some(CHROMIUM_DEVTOOLS_SOCKET));
        let keys: Vec<&str> = entries.iter().map(|(e, _)| e.webview.as_str()).collect();
        assert_eq!(keys, vec!["CHROMIUM"]);
        assert_eq!(dropped.len(), 3);
    }
}
