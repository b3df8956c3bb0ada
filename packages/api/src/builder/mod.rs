//! Pipeline builder API modules
//!
//! `core` holds the builder and its endpoint settings, `headers` the
//! shared and per-request headers, `methods` the batch contents, tuning
//! knobs and the terminal `send`.

pub mod core;
pub mod headers;
pub mod methods;

pub use core::Pipeline;
