// src/store/mod.rs
// =============================================================================
// File-backed collaborators of the poll loop.
//
// - endpoint_log: append-only log of discovered endpoints (survives restarts)
// - report:       one text report per detected change
// - targets:      the list of script URLs to watch
//
// None of these hold file handles open between calls.
// =============================================================================

mod endpoint_log;
mod report;
mod targets;

pub use endpoint_log::EndpointLog;
pub use report::{ChangeReport, FileReportSink, ReportSink};
pub use targets::load_targets;
