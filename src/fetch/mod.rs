// src/fetch/mod.rs
// =============================================================================
// Fetching target scripts.
//
// The poll loop depends only on the Fetcher trait; HttpFetcher is the real
// implementation used by the binary.
// =============================================================================

mod http;

pub use http::{Fetcher, HttpFetcher};
