//! Pipelining client facade
//!
//! `PipelineClient` validates its configuration once and runs each batch in
//! a fresh session: its own connection, counters and retry state.

pub mod core;

pub use core::{PipelineClient, run_urls};
