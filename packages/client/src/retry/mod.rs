//! Retry policy and the coordinator that applies it
//!
//! `RetryPolicy` holds the limits and the backoff curve; `RetryCoordinator`
//! runs a batch round by round and requeues what failed.

pub mod coordinator;
pub mod policy;

pub use coordinator::RetryCoordinator;
pub use policy::RetryPolicy;
