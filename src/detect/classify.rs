// src/detect/classify.rs
// =============================================================================
// Change classification.
//
// Every successfully fetched target ends up in exactly one of three buckets:
// - NewTarget: never seen by this process before
// - Changed:   seen before, fingerprint differs
// - Unchanged: seen before, same fingerprint
//
// Whether that deserves an alert also depends on the endpoints found in this
// cycle and on whether this is the process's very first pass over the list.
// =============================================================================

use std::collections::HashMap;

use super::diff::UnifiedDiff;
use super::fingerprint::Fingerprint;

/// Last known version of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub fingerprint: Fingerprint,
    pub content: String,
}

/// Last known version of every target, keyed by URL exactly as written in
/// the target list.
#[derive(Debug, Default)]
pub struct TargetStateStore {
    records: HashMap<String, TargetRecord>,
}

impl TargetStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&TargetRecord> {
        self.records.get(url)
    }

    /// Stores `record` for `url`, returning whatever it replaced.
    pub fn replace(&mut self, url: &str, record: TargetRecord) -> Option<TargetRecord> {
        self.records.insert(url.to_string(), record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NewTarget {
        fingerprint: Fingerprint,
        new_endpoints: Vec<String>,
    },
    Unchanged {
        fingerprint: Fingerprint,
        new_endpoints: Vec<String>,
    },
    Changed {
        old: TargetRecord,
        new_fingerprint: Fingerprint,
        diff: UnifiedDiff,
        new_endpoints: Vec<String>,
    },
}

impl Classification {
    pub fn new_endpoints(&self) -> &[String] {
        match self {
            Classification::NewTarget { new_endpoints, .. }
            | Classification::Unchanged { new_endpoints, .. }
            | Classification::Changed { new_endpoints, .. } => new_endpoints,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Classification::NewTarget { fingerprint, .. }
            | Classification::Unchanged { fingerprint, .. } => *fingerprint,
            Classification::Changed { new_fingerprint, .. } => *new_fingerprint,
        }
    }

    /// Short label for logs and cycle summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::NewTarget { .. } => "new",
            Classification::Unchanged { .. } => "unchanged",
            Classification::Changed { .. } => "changed",
        }
    }
}

/// Outcome of classifying one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub classification: Classification,
    pub should_alert: bool,
}

/// Classifies a fetched target against the store and updates the store.
///
/// Alert policy:
/// - a new target alerts only if it exposed endpoints
/// - a changed target always alerts
/// - an unchanged target alerts only for new endpoints, and never during the
///   first cycle of the process (every endpoint is "new" then)
///
/// `first_cycle` is process-wide, not per target: a target added to the list
/// later is treated as `NewTarget` on first sight anyway.
pub fn classify(
    store: &mut TargetStateStore,
    url: &str,
    fingerprint: Fingerprint,
    content: String,
    new_endpoints: Vec<String>,
    first_cycle: bool,
) -> Verdict {
    let record = TargetRecord {
        fingerprint,
        content,
    };

    match store.records.get_mut(url) {
        None => {
            store.replace(url, record);
            tracing::info!(url = %url, fingerprint = %fingerprint, "stored initial version");
            let should_alert = !new_endpoints.is_empty();
            Verdict {
                classification: Classification::NewTarget {
                    fingerprint,
                    new_endpoints,
                },
                should_alert,
            }
        }
        Some(known) if known.fingerprint != fingerprint => {
            let diff = UnifiedDiff::between(&known.content, &record.content);
            let old = std::mem::replace(known, record);
            tracing::warn!(
                url = %url,
                old = %old.fingerprint,
                new = %fingerprint,
                "content changed"
            );
            Verdict {
                classification: Classification::Changed {
                    old,
                    new_fingerprint: fingerprint,
                    diff,
                    new_endpoints,
                },
                should_alert: true,
            }
        }
        Some(_) => {
            tracing::debug!(url = %url, fingerprint = %fingerprint, "no changes");
            let should_alert = !new_endpoints.is_empty() && !first_cycle;
            Verdict {
                classification: Classification::Unchanged {
                    fingerprint,
                    new_endpoints,
                },
                should_alert,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://x.test/app.js";

    fn run(
        store: &mut TargetStateStore,
        content: &str,
        endpoints: &[&str],
        first_cycle: bool,
    ) -> Verdict {
        classify(
            store,
            URL,
            Fingerprint::of(content),
            content.to_string(),
            endpoints.iter().map(|e| e.to_string()).collect(),
            first_cycle,
        )
    }

    #[test]
    fn test_new_target_without_endpoints_is_silent() {
        let mut store = TargetStateStore::new();
        let verdict = run(&mut store, "var x = 1;", &[], true);
        assert!(matches!(verdict.classification, Classification::NewTarget { .. }));
        assert!(!verdict.should_alert);
        assert_eq!(store.records.len(), 1);
    }

    #[test]
    fn test_new_target_with_endpoints_alerts_even_on_first_cycle() {
        let mut store = TargetStateStore::new();
        let verdict = run(&mut store, "const a='/api/v1/users'", &["/api/v1/users"], true);
        assert!(verdict.should_alert);
        assert_eq!(verdict.classification.new_endpoints(), ["/api/v1/users"]);
    }

    #[test]
    fn test_changed_target_replaces_record_and_alerts() {
        let mut store = TargetStateStore::new();
        run(&mut store, "const a='/api/v1/users'", &[], true);

        let verdict = run(&mut store, "const a='/api/v1/users'; const b=2;", &[], false);
        let Classification::Changed { old, new_fingerprint, diff, .. } = &verdict.classification else {
            panic!("expected a change, got {:?}", verdict.classification);
        };
        assert!(verdict.should_alert);
        assert_eq!(old.fingerprint, Fingerprint::of("const a='/api/v1/users'"));
        assert_ne!(old.fingerprint, *new_fingerprint);
        assert_eq!(diff.added_lines().len(), 1);

        let stored = store.get(URL).unwrap();
        assert_eq!(stored.fingerprint, *new_fingerprint);
        assert_eq!(stored.content, "const a='/api/v1/users'; const b=2;");
        assert_eq!(store.records.len(), 1);
    }

    #[test]
    fn test_change_alerts_even_during_first_cycle() {
        let mut store = TargetStateStore::new();
        run(&mut store, "a", &[], true);
        assert!(run(&mut store, "b", &[], true).should_alert);
    }

    #[test]
    fn test_unchanged_endpoints_suppressed_on_first_cycle() {
        let mut store = TargetStateStore::new();
        run(&mut store, "same", &[], true);

        let first = run(&mut store, "same", &["/api/late"], true);
        assert!(matches!(first.classification, Classification::Unchanged { .. }));
        assert!(!first.should_alert);

        let later = run(&mut store, "same", &["/api/late"], false);
        assert!(later.should_alert);
        assert_eq!(later.classification.new_endpoints(), ["/api/late"]);
    }

    #[test]
    fn test_unchanged_without_endpoints_is_silent() {
        let mut store = TargetStateStore::new();
        run(&mut store, "same", &[], true);
        assert!(!run(&mut store, "same", &[], false).should_alert);
    }
}
