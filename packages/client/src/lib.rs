//! # hpipe client
//!
//! HTTP/1.1 pipelining client for large batches of small requests against a
//! single origin, such as metadata probes against an object store.
//!
//! Requests are written back to back on one connection without waiting for
//! responses, and responses are paired with requests strictly in order. A
//! dropped connection, a timeout or a garbled response fails only the
//! requests still waiting for an answer; those are resubmitted on a fresh
//! connection with exponential backoff until they succeed or run out of
//! attempts.
//!
//! ## Features
//!
//! - **Bounded pipeline depth**: large batches are split into rounds
//! - **Per-request outcomes**: every input index gets exactly one response
//!   or terminal failure
//! - **Retry with backoff and jitter**, with a short-circuit for endpoints
//!   that refuse connections
//! - **Rustls TLS** with webpki roots, `http/1.1` ALPN
//! - **Session telemetry** with cache-padded atomic counters
//!
//! ## Usage
//!
//! ```no_run
//! use hpipe_client::prelude::*;
//!
//! # async fn probe() -> hpipe_client::Result<()> {
//! let client = PipelineClient::new(PipelineConfig::object_storage("bucket.example.com"))?;
//! let batch = BatchSpec::head().targets((0..1000).map(|i| format!("/objects/{i}.jpg")));
//!
//! let result = client.run(batch).await?;
//! for (index, response) in result.responses() {
//!     println!("{index}: {} {:?}", response.status, response.content_length());
//! }
//! for (index, failure) in result.failures() {
//!     println!("{index}: {} after {} attempts", failure.kind, failure.attempts);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod connect;
pub mod error;
pub mod http;
pub mod protocols;
pub mod retry;
pub mod telemetry;
pub mod tls;

pub mod prelude;

pub use crate::client::{PipelineClient, run_urls};
pub use crate::config::{PipelineConfig, TimeoutConfig};
pub use crate::error::{Error, Kind, Result};
pub use crate::http::{
    BatchResult, BatchSpec, Endpoint, Failure, Outcome, PipelineRequest, PipelineResponse,
    RequestOverride,
};
pub use crate::retry::RetryPolicy;
pub use crate::telemetry::PipelineStatsSnapshot;
