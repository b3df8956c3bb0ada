//! Wire protocols
//!
//! Only HTTP/1.1 is spoken: pipelining is an HTTP/1.1 feature, and the
//! round machinery in `h1` is what the retry coordinator drives.

pub mod h1;

pub use h1::{RoundReport, RoundSettings, run_round};
