//! Context list helpers shared by the CLI and capability composition.

use tracing::debug;
use wvscout_core::{CHROMIUM_WIN, NATIVE_WIN, ScoutError, WEBVIEW_BASE, WEBVIEW_WIN, WebviewEntry};

/// Package of stable Chrome.
pub const CHROME_PACKAGE_NAME: &str = "com.android.chrome";

/// Chrome release channels. Their webviews are the browser itself.
pub const KNOWN_CHROME_PACKAGE_NAMES: &[&str] = &[
    "com.android.chrome",
    "com.chrome.beta",
    "com.chrome.dev",
    "com.chrome.canary",
];

/// Launch target of a browser flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserPackage {
    pub package: &'static str,
    pub activity: &'static str,
}

// See chrome/browser/devtools/device/android_device_info_query.cc
const BROWSER_PACKAGES: &[(&str, BrowserPackage)] = &[
    ("chrome", BrowserPackage {
        package: "com.android.chrome",
        activity: "com.google.android.apps.chrome.Main",
    }),
    ("chromium", BrowserPackage {
        package: "org.chromium.chrome.shell",
        activity: ".ChromeShellActivity",
    }),
    ("chromebeta", BrowserPackage {
        package: "com.chrome.beta",
        activity: "com.google.android.apps.chrome.Main",
    }),
    ("browser", BrowserPackage {
        package: "com.android.browser",
        activity: "com.android.browser.BrowserActivity",
    }),
    ("chromium-browser", BrowserPackage {
        package: "org.chromium.chrome",
        activity: "com.google.android.apps.chrome.Main",
    }),
    ("chromium-webview", BrowserPackage {
        package: "org.chromium.webview_shell",
        activity: "org.chromium.webview_shell.WebViewBrowserActivity",
    }),
];

const DEFAULT_BROWSER_PACKAGE: BrowserPackage = BrowserPackage {
    package: "com.android.chrome",
    activity: "com.google.android.apps.chrome.Main",
};

/// Package/activity for a browser name, case-insensitive. Unknown names get Chrome.
pub fn chrome_package_for_browser(browser: &str) -> BrowserPackage {
    let browser = browser.to_lowercase();
    BROWSER_PACKAGES
        .iter()
        .find(|(name, _)| *name == browser)
        .map(|(_, pkg)| *pkg)
        .unwrap_or(DEFAULT_BROWSER_PACKAGE)
}

/// Full context list: the native surface first, then the webviews.
pub fn assign_contexts(webview_names: &[String]) -> Vec<String> {
    let mut contexts = Vec::with_capacity(webview_names.len() + 1);
    contexts.push(NATIVE_WIN.to_string());
    contexts.extend(webview_names.iter().cloned());
    debug!(?contexts, "available contexts");
    contexts
}

/// The context `WEBVIEW` stands for in a session.
pub fn default_webview_name(auto_webview_name: Option<&str>, app_package: Option<&str>) -> Option<String> {
    auto_webview_name
        .or(app_package)
        .map(|name| format!("{WEBVIEW_BASE}{name}"))
}

/// Map a requested context to a concrete one: nothing means `NATIVE_APP`,
/// bare `WEBVIEW` means the session default.
pub fn resolve_context_name(
    requested: Option<&str>,
    auto_webview_name: Option<&str>,
    app_package: Option<&str>,
) -> wvscout_core::Result<String> {
    match requested {
        None | Some("") => Ok(NATIVE_WIN.to_string()),
        Some(WEBVIEW_WIN) => default_webview_name(auto_webview_name, app_package)
            .ok_or_else(|| ScoutError::NoSuchContext(WEBVIEW_WIN.to_string())),
        Some(name) => Ok(name.to_string()),
    }
}

/// Pick `name` out of the available contexts.
pub fn select_context(name: &str, contexts: &[String]) -> wvscout_core::Result<String> {
    contexts
        .iter()
        .find(|c| *c == name)
        .cloned()
        .ok_or_else(|| ScoutError::NoSuchContext(name.to_string()))
}

pub fn is_web_context(name: Option<&str>) -> bool {
    name.is_some_and(|n| n != NATIVE_WIN)
}

/// Whether switching to `name` needs a Chromedriver.
pub fn is_chromedriver_context(name: &str) -> bool {
    name.contains(WEBVIEW_WIN) || name == CHROMIUM_WIN
}

/// Android package Chromedriver should attach to for `context`.
///
/// With `extract_from_name` (always for `WEBVIEW_chrome`) the package is the
/// context name suffix. Unless extraction was explicitly asked for, a package
/// reported by the webview's `/json/version` wins.
pub fn android_package_for_context(
    context: &str,
    entries: &[WebviewEntry],
    extract_from_name: bool,
) -> Option<String> {
    let mut package = None;
    if extract_from_name || context == format!("{WEBVIEW_BASE}chrome") {
        package = context
            .strip_prefix(WEBVIEW_BASE)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
    }
    if !extract_from_name
        && let Some(reported) = entries
            .iter()
            .find(|e| e.webview_name.as_deref() == Some(context))
            .and_then(|e| e.info.as_ref())
            .and_then(|i| i.android_package.clone())
    {
        debug!(%context, package = %reported, "identified android package by CDP");
        package = Some(reported);
    }
    package
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvscout_core::DevToolsVersionInfo;

    fn entry(name: &str, android_package: Option<&str>) -> WebviewEntry {
        let mut e = WebviewEntry::new("@chrome_devtools_remote", name);
        e.webview_name = Some(name.into());
        e.info = android_package.map(|p| DevToolsVersionInfo {
            android_package: Some(p.into()),
            ..Default::default()
        });
        e
    }

    #[test]
    fn test_assign_contexts_native_first() {
        let contexts = assign_contexts(&["WEBVIEW_a".into(), "CHROMIUM".into()]);
        assert_eq!(contexts, vec!["NATIVE_APP", "WEBVIEW_a", "CHROMIUM"]);
        assert_eq!(assign_contexts(&[]), vec!["NATIVE_APP"]);
    }

    #[test]
    fn test_default_webview_name_prefers_auto_name() {
        assert_eq!(
            default_webview_name(Some("custom"), Some("com.example")).as_deref(),
            Some("WEBVIEW_custom")
        );
        assert_eq!(
            default_webview_name(None, Some("com.example")).as_deref(),
            Some("WEBVIEW_com.example")
        );
        assert!(default_webview_name(None, None).is_none());
    }

    #[test]
    fn test_resolve_context_name() {
        assert_eq!(resolve_context_name(None, None, None).unwrap(), "NATIVE_APP");
        assert_eq!(
            resolve_context_name(Some("WEBVIEW"), None, Some("com.example")).unwrap(),
            "WEBVIEW_com.example"
        );
        assert_eq!(resolve_context_name(Some("CHROMIUM"), None, None).unwrap(), "CHROMIUM");
        assert!(resolve_context_name(Some("WEBVIEW"), None, None).is_err());
    }

    #[test]
    fn test_select_context() {
        let contexts = assign_contexts(&["WEBVIEW_a".into()]);
        assert_eq!(select_context("WEBVIEW_a", &contexts).unwrap(), "WEBVIEW_a");
        assert!(matches!(
            select_context("WEBVIEW_b", &contexts),
            Err(ScoutError::NoSuchContext(_))
        ));
    }

    #[test]
    fn test_context_predicates() {
        assert!(is_chromedriver_context("WEBVIEW_com.example"));
        assert!(is_chromedriver_context("CHROMIUM"));
        assert!(!is_chromedriver_context("NATIVE_APP"));
        assert!(is_web_context(Some("CHROMIUM")));
        assert!(!is_web_context(Some("NATIVE_APP")));
        assert!(!is_web_context(None));
    }

    #[test]
    fn test_package_for_chrome_context_prefers_cdp() {
        let entries = vec![entry("WEBVIEW_chrome", Some("com.chrome.beta"))];
        assert_eq!(
            android_package_for_context("WEBVIEW_chrome", &entries, false).as_deref(),
            Some("com.chrome.beta")
        );
        assert_eq!(
            android_package_for_context("WEBVIEW_chrome", &[], false).as_deref(),
            Some("chrome")
        );
    }

    #[test]
    fn test_package_extracted_from_name_ignores_cdp() {
        let entries = vec![entry("WEBVIEW_com.example", Some("com.other"))];
        assert_eq!(
            android_package_for_context("WEBVIEW_com.example", &entries, true).as_deref(),
            Some("com.example")
        );
        assert_eq!(
            android_package_for_context("WEBVIEW_com.example", &entries, false).as_deref(),
            Some("com.other")
        );
        assert!(android_package_for_context("WEBVIEW_com.example", &[], false).is_none());
    }

    #[test]
    fn test_chrome_package_for_browser() {
        assert_eq!(chrome_package_for_browser("ChromeBeta").package, "com.chrome.beta");
        assert_eq!(chrome_package_for_browser("chromium").activity, ".ChromeShellActivity");
        assert_eq!(chrome_package_for_browser("safari"), DEFAULT_BROWSER_PACKAGE);
    }
}
