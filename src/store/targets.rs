// src/store/targets.rs
// =============================================================================
// Reads the target list: one script URL per line.
//
// The file is re-read at the start of every cycle, so targets can be added
// or removed while the monitor is running.
// =============================================================================

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{MonitorError, Result};

/// Returns the http(s) URLs in `path`, in file order.
///
/// Blank lines, comments and anything else without an http:// or https://
/// scheme are skipped. URLs are kept exactly as written (after trimming).
pub fn load_targets(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            MonitorError::TargetListMissing(path.to_path_buf())
        } else {
            MonitorError::Read {
                what: "target file",
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(parse_targets(&text))
}

fn parse_targets(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .map(str::to_string)
        .collect()
}
