// src/store/report.rs
// =============================================================================
// Per-change report files.
//
// Every time a target's content changes, a self-contained text report is
// written with, in order:
//   header (URL, timestamp, old/new hash)
//   full unified diff
//   added lines only
//   full old content
//   full new content
//
// The poll loop only sees the ReportSink trait and gets back the report's
// file name, which it puts into the alert.
// =============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::detect::{Fingerprint, UnifiedDiff};
use crate::error::{MonitorError, Result};

/// Characters replaced by '_' when turning a URL into a file name.
const UNSAFE_FILENAME_CHARS: &[char] = &['/', '?', '&', ':', '|', '<', '>', '\\', '*', '"'];

/// Longest URL-derived prefix kept in a report file name.
const MAX_PREFIX_CHARS: usize = 150;

/// Everything needed to render one change report.
pub struct ChangeReport<'a> {
    pub url: &'a str,
    pub detected_at: DateTime<Local>,
    pub old_fingerprint: Fingerprint,
    pub new_fingerprint: Fingerprint,
    pub diff: &'a UnifiedDiff,
    pub old_content: &'a str,
    pub new_content: &'a str,
}

impl ChangeReport<'_> {
    /// Stable name for this report, e.g. `x.test_app.js_20260101-120000.txt`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.txt",
            filename_prefix(self.url),
            self.detected_at.format("%Y%m%d-%H%M%S")
        )
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Change detected for URL: {}", self.url);
        let _ = writeln!(out, "Timestamp: {}", self.detected_at.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Old Hash (MD5): {}", self.old_fingerprint);
        let _ = writeln!(out, "New Hash (MD5): {}", self.new_fingerprint);

        out.push_str(&section_header("FULL UNIFIED DIFF (Code Blocks)", 30, 30));
        if self.diff.is_empty() {
            out.push_str("No textual differences found by diff utility.\n");
        } else {
            out.push_str(self.diff.as_str());
        }

        let added = self.diff.added_lines();
        out.push('\n');
        out.push_str(&section_header("ADDED LINES ONLY", 33, 33));
        if added.is_empty() {
            out.push_str("No lines were explicitly added according to the diff.\n");
        } else {
            for line in added {
                out.push_str(line);
                out.push('\n');
            }
        }

        out.push('\n');
        out.push_str(&section_header("OLD CONTENT", 34, 35));
        out.push_str(self.old_content);
        out.push('\n');
        out.push_str(&section_header("NEW CONTENT", 34, 35));
        out.push_str(self.new_content);
        out
    }
}

fn section_header(title: &str, left: usize, right: usize) -> String {
    format!("\n{} {} {}\n", "=".repeat(left), title, "=".repeat(right))
}

/// Scheme dropped, unsafe characters replaced, long names shortened in the
/// middle so both the host and the file name survive.
fn filename_prefix(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let cleaned: String = without_scheme
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() <= MAX_PREFIX_CHARS {
        return cleaned;
    }
    let half = MAX_PREFIX_CHARS / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{head}...{tail}")
}

/// Where change reports go.
pub trait ReportSink {
    /// Persists the report and returns the identifier to quote in alerts.
    fn store(&self, report: &ChangeReport<'_>) -> Result<String>;
}

/// Writes each report as a file inside one directory.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    dir: PathBuf,
}

impl FileReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for FileReportSink {
    fn store(&self, report: &ChangeReport<'_>) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|source| MonitorError::Write {
            what: "report directory",
            path: self.dir.clone(),
            source,
        })?;

        let name = report.file_name();
        let path = self.dir.join(&name);
        fs::write(&path, report.render()).map_err(|source| MonitorError::Write {
            what: "change report",
            path: path.clone(),
            source,
        })?;

        tracing::info!(report = %path.display(), "saved change report");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_filename_prefix_sanitizes() {
        assert_eq!(
            filename_prefix("https://x.test/static/app.js?v=1&x=2"),
            "x.test_static_app.js_v=1_x=2"
        );
        assert_eq!(filename_prefix("no-scheme/a"), "no-scheme_a");
    }

    #[test]
    fn test_filename_prefix_shortens_long_urls() {
        let url = format!("https://x.test/{}", "a".repeat(400));
        let prefix = filename_prefix(&url);
        assert_eq!(prefix.chars().count(), MAX_PREFIX_CHARS + 3);
        assert!(prefix.starts_with("x.test_"));
        assert!(prefix.contains("..."));
    }

    #[test]
    fn test_render_and_store() {
        let old = "const a='/api/v1/users'";
        let new = "const a='/api/v1/users'; const b=2;";
        let diff = UnifiedDiff::between(old, new);
        let report = ChangeReport {
            url: "https://x.test/app.js",
            detected_at: fixed_time(),
            old_fingerprint: Fingerprint::of(old),
            new_fingerprint: Fingerprint::of(new),
            diff: &diff,
            old_content: old,
            new_content: new,
        };

        assert_eq!(report.file_name(), "x.test_app.js_20260314-092653.txt");

        let text = report.render();
        let order = [
            "Change detected for URL: https://x.test/app.js",
            "Old Hash (MD5): ",
            " FULL UNIFIED DIFF (Code Blocks) ",
            "+const a='/api/v1/users'; const b=2;",
            " ADDED LINES ONLY ",
            " OLD CONTENT ",
            " NEW CONTENT ",
        ];
        let mut cursor = 0;
        for needle in order {
            let found = text[cursor..].find(needle).unwrap_or_else(|| panic!("missing {needle:?}"));
            cursor += found + needle.len();
        }
        assert!(text.ends_with(new));

        let dir = tempfile::tempdir().unwrap();
        let sink = FileReportSink::new(dir.path().join("js_changes"));
        let name = sink.store(&report).unwrap();
        let on_disk = fs::read_to_string(dir.path().join("js_changes").join(&name)).unwrap();
        assert_eq!(on_disk, text);
    }

    #[test]
    fn test_render_without_added_lines() {
        let diff = UnifiedDiff::between("a\nb\n", "a\n");
        let report = ChangeReport {
            url: "https://x.test/app.js",
            detected_at: fixed_time(),
            old_fingerprint: Fingerprint::of("a\nb\n"),
            new_fingerprint: Fingerprint::of("a\n"),
            diff: &diff,
            old_content: "a\nb\n",
            new_content: "a\n",
        };
        assert!(report
            .render()
            .contains("No lines were explicitly added according to the diff."));
    }
}
