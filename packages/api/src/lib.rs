//! hpipe: batch HTTP/1.1 requests over one pipelined connection
//!
//! A fluent front end for `hpipe_client`. Describe the endpoint and the
//! targets, then `send` the batch and read one outcome per request.
//!
//! ```no_run
//! use hpipe::Pipeline;
//!
//! # async fn probe() -> hpipe::Result<()> {
//! let result = Pipeline::head()
//!     .urls((0..100).map(|i| format!("https://bucket.example.com/photos/{i}.jpg")))
//!     .max_depth(100)
//!     .send()
//!     .await?;
//!
//! for (index, response) in result.responses() {
//!     println!("{index}: {:?}", response.content_length());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod builder;

pub use builder::Pipeline;

// Re-export the client types a caller needs to read results or go lower level
pub use hpipe_client::{
    BatchResult, BatchSpec, Endpoint, Error, Failure, Kind, Outcome, PipelineClient,
    PipelineConfig, PipelineResponse, PipelineStatsSnapshot, RequestOverride, Result, RetryPolicy,
    TimeoutConfig, run_urls,
};
