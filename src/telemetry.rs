//! Telemetry metric name constants.
//!
//! Centralised metric names for relay operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `discourse_relay_`. Counters end in
//! `_total`, histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `operation`: relay operation (e.g. "search", "topic", "posts")
//! - `status`: outcome: "ok" or "error"
//! - `op`: store command: "get" or "set"

/// Total requests sent to the upstream forum.
///
/// Labels: `operation`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "discourse_relay_upstream_requests_total";

/// Upstream request duration in seconds.
///
/// Labels: `operation`.
pub const UPSTREAM_DURATION_SECONDS: &str = "discourse_relay_upstream_duration_seconds";

/// Total read-through cache hits.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "discourse_relay_cache_hits_total";

/// Total read-through cache misses, including lookups against an absent or
/// failing store.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "discourse_relay_cache_misses_total";

/// Total store commands that failed and were swallowed.
///
/// Labels: `op` ("get" | "set").
pub const STORE_ERRORS_TOTAL: &str = "discourse_relay_store_errors_total";
