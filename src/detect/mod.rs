// src/detect/mod.rs
// =============================================================================
// Everything that looks at fetched content and decides what is new.
//
// Submodules:
// - fingerprint: MD5 content fingerprints
// - endpoints:   quoted path literal discovery + cross-run dedup
// - diff:        unified line diff between two versions
// - classify:    new / changed / unchanged, and whether to alert
//
// Nothing in here does network I/O; the only side effect is the endpoint
// log append inside EndpointExtractor::discover.
// =============================================================================

mod classify;
mod diff;
mod endpoints;
mod fingerprint;

pub use classify::{classify, Classification, TargetStateStore};
pub use diff::UnifiedDiff;
pub use endpoints::{EndpointExtractor, KnownEndpoints};
pub use fingerprint::Fingerprint;

#[cfg(test)]
pub use classify::TargetRecord;
