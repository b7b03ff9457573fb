//! PID → package resolution for PID-suffixed webview sockets.

use tracing::{debug, warn};
use wvscout_core::{Degradation, Outcome, ProcessInfo, ScoutError, WEBVIEW_BASE, WebviewEntry};

use crate::channel::DeviceChannel;
use crate::classify::SocketKind;

/// Find the process name for `pid` in `ps` output.
///
/// The PID column is located from the header row. The name is always the
/// last column: old toolbox `ps` prints an unlabelled state column before it.
pub fn find_name_by_pid(ps_output: &str, pid: u32) -> wvscout_core::Result<String> {
    let mut lines = ps_output.lines().map(str::trim).filter(|l| !l.is_empty());
    let pid_index = lines
        .by_ref()
        .find_map(|header| {
            let titles: Vec<&str> = header.split_whitespace().collect();
            if titles.contains(&"NAME") {
                titles.iter().position(|t| *t == "PID")
            } else {
                None
            }
        })
        .ok_or_else(|| ScoutError::Adb {
            command: "ps".into(),
            reason: "no PID/NAME header in process list".into(),
        })?;

    let wanted = pid.to_string();
    for line in lines {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.get(pid_index) == Some(&wanted.as_str())
            && let Some(name) = cols.last()
        {
            return Ok(name.to_string());
        }
    }
    Err(ScoutError::ProcessNotFound(pid))
}

/// Give a classified entry its final context name.
///
/// Package-suffixed keys are already final. PID-suffixed keys are rewritten to
/// `WEBVIEW_<package>`; if the owning process cannot be found the entry is
/// dropped, a bare PID is never exposed as a context name.
pub async fn resolve_process(
    device: &dyn DeviceChannel,
    mut entry: WebviewEntry,
    kind: &SocketKind,
) -> Outcome<WebviewEntry> {
    match kind {
        SocketKind::Chromium => {
            entry.webview_name = Some(entry.webview.clone());
        }
        SocketKind::Package(pkg) => {
            entry.webview_name = Some(format!("{WEBVIEW_BASE}{pkg}"));
            entry.process = Some(ProcessInfo {
                name: pkg.clone(),
                id: None,
            });
        }
        SocketKind::Pid(pid) => {
            debug!(webview = %entry.webview, %pid, "getting process name for webview");
            let name = match pid.parse::<u32>() {
                Ok(n) => device.name_by_pid(n).await,
                Err(_) => Err(ScoutError::ProcessNotFound(0)),
            };
            match name {
                Ok(pkg) => {
                    debug!(webview = %entry.webview, process = %pkg, "got process name");
                    entry.webview_name = Some(format!("{WEBVIEW_BASE}{pkg}"));
                    entry.process = Some(ProcessInfo {
                        name: pkg,
                        id: Some(pid.clone()),
                    });
                }
                Err(e) => {
                    warn!(webview = %entry.webview, proc = %entry.proc, error = %e,
                        "could not resolve webview process, skipping it");
                    return Outcome::Degraded(Degradation::ProcessUnresolved {
                        pid: pid.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
    Outcome::Ok(entry)
}

/// Keep an explicitly requested socket's key as its final name.
pub fn keep_provisional_name(mut entry: WebviewEntry) -> WebviewEntry {
    entry.webview_name = Some(entry.webview.clone());
    entry
}
