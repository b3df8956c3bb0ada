//! Prelude
//!
//! The types needed to configure a client, describe a batch and read its
//! result.

pub use crate::client::{PipelineClient, run_urls};
pub use crate::config::{PipelineConfig, TimeoutConfig, Validator};
pub use crate::connect::{Connector, TcpConnector};
pub use crate::error::{Error, Kind, Result};
pub use crate::http::{
    BatchResult, BatchSpec, Endpoint, Failure, Outcome, PipelineRequest, PipelineResponse,
    RequestOverride,
};
pub use crate::retry::RetryPolicy;
pub use crate::telemetry::PipelineStatsSnapshot;

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
