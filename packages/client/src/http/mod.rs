//! Request, response and batch result types
//!
//! `BatchSpec` is the input side (one method and header set, many targets),
//! `PipelineResponse` is what the reader parses off the wire, and
//! `BatchResult` is the per-index outcome the coordinator hands back.

pub mod batch;
pub mod request;
pub mod response;
pub mod url;

pub use batch::{BatchResult, Failure, Outcome};
pub use request::{BatchSpec, PipelineRequest, RequestOverride};
pub use response::PipelineResponse;
pub use url::Endpoint;
