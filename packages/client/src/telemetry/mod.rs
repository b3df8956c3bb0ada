//! Session telemetry
//!
//! Counters are collected per pipelining session and reported with the
//! batch result.

pub mod pipeline_stats;

pub use pipeline_stats::{PipelineStats, PipelineStatsSnapshot};
