// src/detect/endpoints.rs
// =============================================================================
// This module finds "endpoints": quoted, path-like string literals such as
// '/api/v1/users' or "/static/app.js" inside a script.
//
// How it works:
// 1. PathLiteralMatcher finds every quoted literal that starts with '/'
// 2. Each candidate is normalized (one trailing slash dropped)
// 3. Candidates are serialized as "<path> (Source: <url>)" lines
// 4. Lines already in KnownEndpoints are dropped; the rest are recorded
//    in memory and appended to the endpoint log
//
// The serialized line is the dedup key, so the same path found in two
// different scripts is reported once per script.
// =============================================================================

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use regex::Regex;

use crate::store::EndpointLog;

/// Marker every valid endpoint log line contains.
pub const SOURCE_MARKER: &str = "(Source: ";

/// Characters allowed inside a path literal, as a regex class.
const PATH_CHARS: &str = "[A-Za-z0-9_./-]";

/// Shortest run of path characters after the leading slash.
const MIN_PATH_CHARS: usize = 2;

/// Matches quoted path literals.
///
/// The grammar is: an opening quote (' " or `), a '/', at least two path
/// characters, and a closing quote of the same kind. The regex crate has no
/// backreferences, so there is one alternation branch per quote kind.
pub struct PathLiteralMatcher {
    pattern: Regex,
}

impl PathLiteralMatcher {
    pub fn new() -> Self {
        let body = format!("(/{PATH_CHARS}{{{MIN_PATH_CHARS},}})");
        let branches: Vec<String> = ['\'', '"', '`']
            .iter()
            .map(|quote| format!("{quote}{body}{quote}"))
            .collect();
        // The pattern is built from constants above, so it always compiles
        let pattern = Regex::new(&branches.join("|")).expect("path literal pattern is valid");
        Self { pattern }
    }

    /// Returns every distinct normalized candidate, sorted.
    pub fn candidates(&self, content: &str) -> BTreeSet<String> {
        self.pattern
            .captures_iter(content)
            .filter_map(|caps| caps.iter().skip(1).flatten().next())
            .filter_map(|m| normalize_candidate(m.as_str()))
            .collect()
    }
}

impl Default for PathLiteralMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops a single trailing slash (but never turns "/" into ""), then
/// discards empty results.
pub fn normalize_candidate(raw: &str) -> Option<String> {
    let path = raw.trim();
    let path = if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    };
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// One discovered endpoint and the script it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRecord<'a> {
    pub path: &'a str,
    pub source_url: &'a str,
}

impl fmt::Display for EndpointRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{})", self.path, SOURCE_MARKER, self.source_url)
    }
}

/// Every endpoint line ever recorded. Only grows.
#[derive(Debug, Default)]
pub struct KnownEndpoints {
    lines: HashSet<String>,
}

impl KnownEndpoints {
    /// Seeds the set from previously logged lines. Lines without the
    /// source marker (half-written or foreign) are ignored.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = lines
            .into_iter()
            .filter(|line| line.as_ref().contains(SOURCE_MARKER))
            .map(|line| line.as_ref().trim().to_string())
            .collect();
        Self { lines }
    }

    /// Returns `true` if the line was not known before.
    pub fn insert(&mut self, line: String) -> bool {
        self.lines.insert(line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Finds endpoints in a script and records the ones never seen before.
#[derive(Default)]
pub struct EndpointExtractor {
    matcher: PathLiteralMatcher,
}

impl EndpointExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `content` from `source_url` and returns the paths that were
    /// not in `known` yet, in sorted order.
    ///
    /// New lines are added to `known` and appended to `log`. A failed log
    /// write is reported but does not drop the endpoints from the result,
    /// so the alert still goes out.
    pub fn discover(
        &self,
        content: &str,
        source_url: &str,
        known: &mut KnownEndpoints,
        log: &EndpointLog,
    ) -> Vec<String> {
        let mut new_paths = Vec::new();
        let mut new_lines = Vec::new();

        for path in self.matcher.candidates(content) {
            let line = EndpointRecord { path: &path, source_url }.to_string();
            if known.insert(line.clone()) {
                new_lines.push(line);
                new_paths.push(path);
            }
        }

        if new_lines.is_empty() {
            return new_paths;
        }

        match log.append(&new_lines) {
            Ok(()) => tracing::info!(
                url = %source_url,
                count = new_lines.len(),
                log = %log.path().display(),
                "discovered new endpoints"
            ),
            Err(e) => tracing::warn!(
                url = %source_url,
                count = new_lines.len(),
                error = %e,
                "discovered new endpoints but could not append them to the log"
            ),
        }

        new_paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidates(content: &str) -> Vec<String> {
        PathLiteralMatcher::new().candidates(content).into_iter().collect()
    }

    fn scratch_log() -> (TempDir, EndpointLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = EndpointLog::new(dir.path().join("endpoints.txt"));
        (dir, log)
    }

    #[test]
    fn test_all_quote_kinds_match() {
        let js = r#"a('/api/a'); b("/api/b"); c(`/api/c`);"#;
        assert_eq!(candidates(js), vec!["/api/a", "/api/b", "/api/c"]);
    }

    #[test]
    fn test_mismatched_quotes_do_not_match() {
        assert!(candidates(r#"x = '/api/users";"#).is_empty());
        assert!(candidates(r#"x = "/api/users`;"#).is_empty());
    }

    #[test]
    fn test_minimum_length_and_leading_slash() {
        // One character after the slash is too short
        assert!(candidates("'/a'").is_empty());
        assert_eq!(candidates("'/ab'"), vec!["/ab"]);
        // Must start with a slash
        assert!(candidates("'api/users'").is_empty());
        // Characters outside the class break the literal
        assert!(candidates("'/api/users?id=1'").is_empty());
        assert!(candidates("'/api users'").is_empty());
    }

    #[test]
    fn test_trailing_slash_stripped_and_deduped() {
        let js = "f('/api/v1/'); g('/api/v1'); h('/api/v1/');";
        assert_eq!(candidates(js), vec!["/api/v1"]);
    }

    #[test]
    fn test_normalize_candidate() {
        assert_eq!(normalize_candidate("/api/"), Some("/api".to_string()));
        assert_eq!(normalize_candidate("//"), Some("/".to_string()));
        assert_eq!(normalize_candidate("/"), Some("/".to_string()));
        assert_eq!(normalize_candidate(""), None);
    }

    #[test]
    fn test_record_serialization() {
        let record = EndpointRecord {
            path: "/api/v1/users",
            source_url: "https://x.test/app.js",
        };
        assert_eq!(record.to_string(), "/api/v1/users (Source: https://x.test/app.js)");
    }

    #[test]
    fn test_known_endpoints_ignore_foreign_lines() {
        let known = KnownEndpoints::from_lines([
            "/api/a (Source: https://x.test/app.js)\n",
            "garbage line",
            "",
        ]);
        assert_eq!(known.len(), 1);
        assert!(known.lines.contains("/api/a (Source: https://x.test/app.js)"));
    }

    #[test]
    fn test_discover_is_idempotent() {
        let (_dir, log) = scratch_log();
        let extractor = EndpointExtractor::new();
        let mut known = KnownEndpoints::default();
        let js = "fetch('/api/users'); fetch(\"/api/orders/\");";

        let first = extractor.discover(js, "https://x.test/app.js", &mut known, &log);
        assert_eq!(first, vec!["/api/orders", "/api/users"]);

        let second = extractor.discover(js, "https://x.test/app.js", &mut known, &log);
        assert!(second.is_empty());
        assert_eq!(known.len(), 2);
        assert_eq!(log.load().unwrap().len(), 2);
    }

    #[test]
    fn test_same_path_from_another_source_is_new() {
        let (_dir, log) = scratch_log();
        let extractor = EndpointExtractor::new();
        let mut known = KnownEndpoints::default();

        extractor.discover("'/api/users'", "https://x.test/a.js", &mut known, &log);
        let other = extractor.discover("'/api/users'", "https://x.test/b.js", &mut known, &log);
        assert_eq!(other, vec!["/api/users"]);
    }

    #[test]
    fn test_discover_scenario_writes_log_line() {
        let (_dir, log) = scratch_log();
        let mut known = KnownEndpoints::default();
        let found = EndpointExtractor::new().discover(
            "const a='/api/v1/users'",
            "https://x.test/app.js",
            &mut known,
            &log,
        );
        assert_eq!(found, vec!["/api/v1/users"]);
        let on_disk = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(on_disk, "/api/v1/users (Source: https://x.test/app.js)\n");
    }

    #[test]
    fn test_failed_log_write_still_reports_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let log = EndpointLog::new(dir.path().to_path_buf());
        let mut known = KnownEndpoints::default();
        let found = EndpointExtractor::new().discover("'/api/x'", "https://x.test/a.js", &mut known, &log);
        assert_eq!(found, vec!["/api/x"]);
        assert_eq!(known.len(), 1);
    }
}
