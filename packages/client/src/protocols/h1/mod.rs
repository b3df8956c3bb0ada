//! HTTP/1.1 pipelining
//!
//! `encode` and `decode` handle the wire format, `queue` is the FIFO that
//! pairs responses with requests, `sender` and `reader` are the two halves
//! of a round and `round` runs them together on one connection.

pub mod decode;
pub mod encode;
pub mod queue;
pub mod reader;
pub mod round;
pub mod sender;

pub use decode::{DecodeLimits, Decoded, ResponseDecoder, decode_response};
pub use encode::{EncodeContext, encode_request};
pub use queue::{Pending, PendingReceiver, PendingSender, pending_queue};
pub use round::{RoundReport, RoundSettings, run_round};
