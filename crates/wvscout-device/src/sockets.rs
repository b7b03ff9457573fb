//! `/proc/net/unix` parsing.
//!
//! ```text
//! Num       RefCount Protocol Flags    Type St Inode Path
//! 0000000000000000: 00000002 00000000 00010000 0001 01 245445 @webview_devtools_remote_123
//! ```

use tracing::debug;

/// Flags/St column pair identifying a listening, connection-oriented socket.
///
/// The values differ between kernel versions, hence configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListeningPattern {
    pub flags: String,
    pub state: String,
}

impl Default for ListeningPattern {
    fn default() -> Self {
        Self {
            flags: "00010000".into(),
            state: "01".into(),
        }
    }
}

/// Result of parsing the socket table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketTable {
    /// Distinct listening abstract socket names, in table order, `@` included.
    pub listening: Vec<String>,
    /// Every line whose path is abstract, listening or not. Diagnostics only.
    pub abstract_lines: Vec<String>,
}

/// Extract listening abstract sockets from raw `/proc/net/unix` output.
pub fn parse_socket_table(raw: &str, pattern: &ListeningPattern) -> SocketTable {
    let mut table = SocketTable::default();

    for line in raw.lines() {
        let line = line.trim();
        let cols: Vec<&str> = line.split_whitespace().collect();
        // Num RefCount Protocol Flags Type St Inode Path
        if cols.len() < 8 {
            continue;
        }
        let (flags, st, path) = (cols[3], cols[5], cols[cols.len() - 1]);
        if !path.starts_with('@') {
            continue;
        }
        table.abstract_lines.push(line.to_string());

        if flags != pattern.flags || st != pattern.state {
            continue;
        }
        // The same socket shows up more than once per app at times.
        if !table.listening.iter().any(|s| s == path) {
            table.listening.push(path.to_string());
        }
    }

    if table.listening.is_empty() {
        debug!("found no active devtools sockets");
        if !table.abstract_lines.is_empty() {
            debug!(other = ?table.abstract_lines, "other abstract sockets");
        }
    } else {
        debug!(
            count = table.listening.len(),
            sockets = ?table.listening,
            "parsed active abstract sockets"
        );
    }

    table
}
