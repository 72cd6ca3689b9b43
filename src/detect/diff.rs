// src/detect/diff.rs
// =============================================================================
// Line-based unified diff between two versions of a script.
//
// The edit script and hunk grouping come from `similar`. Lines are compared
// with their terminators, so a CRLF -> LF conversion or a dropped final
// newline still shows up as changed lines. Terminators are stripped only
// when a line is written out.
//
// A rewritten multi-megabyte bundle can make a minimal diff expensive, so
// the diff runs with a deadline and settles for a coarser edit script when
// it passes.
// =============================================================================

use std::fmt::Write;
use std::time::Duration;

use similar::{ChangeTag, TextDiff};

/// Lines of unchanged context around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// How long the diff may search for a minimal edit script.
const DIFF_DEADLINE: Duration = Duration::from_secs(2);

const OLD_LABEL: &str = "old_version";
const NEW_LABEL: &str = "new_version";

/// Rendered unified diff text (empty when the inputs are identical).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedDiff {
    text: String,
}

impl UnifiedDiff {
    pub fn between(old: &str, new: &str) -> Self {
        let diff = TextDiff::configure()
            .timeout(DIFF_DEADLINE)
            .diff_lines(old, new);
        let mut unified = diff.unified_diff();
        unified.context_radius(CONTEXT_LINES);

        let mut text = String::new();
        for hunk in unified.iter_hunks() {
            if text.is_empty() {
                let _ = writeln!(text, "--- {OLD_LABEL}");
                let _ = writeln!(text, "+++ {NEW_LABEL}");
            }
            let _ = writeln!(text, "{}", hunk.header());
            for change in hunk.iter_changes() {
                let sign = match change.tag() {
                    ChangeTag::Equal => ' ',
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                };
                let _ = writeln!(text, "{sign}{}", strip_terminator(change.value()));
            }
        }
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lines the new version added, without the leading '+'.
    pub fn added_lines(&self) -> Vec<&str> {
        self.text
            .lines()
            .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
            .map(|line| &line[1..])
            .collect()
    }
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(line)
}
