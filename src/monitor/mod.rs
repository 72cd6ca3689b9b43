// src/monitor/mod.rs
// =============================================================================
// The long-running part of the program.
//
// - poll:     Monitor, which drives fetch -> classify -> alert per target
// - shutdown: the Ctrl-C flag the loop checks between steps
// =============================================================================

mod poll;
mod shutdown;

pub use poll::{CycleSummary, Monitor, TargetOutcome};
pub use shutdown::{channel as shutdown_channel, Shutdown};
