//! Request serialization
//!
//! Requests are written in origin form with the caller's headers in order,
//! followed by the headers the session adds when the caller left them out:
//! `Host`, `User-Agent`, `Content-Length` and, for the last request of a
//! non-persistent round, `Connection: close`.

use bytes::{BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING, USER_AGENT};

use crate::http::PipelineRequest;

/// Session-wide values stamped onto every request.
#[derive(Debug, Clone)]
pub struct EncodeContext {
    /// Value of the `Host` header (`host[:port]`)
    pub authority: String,
    pub user_agent: Option<String>,
}

/// Append `request` to `dst` as one complete HTTP/1.1 message.
///
/// Returns the number of bytes appended.
pub fn encode_request(
    request: &PipelineRequest,
    ctx: &EncodeContext,
    close: bool,
    dst: &mut BytesMut,
) -> usize {
    let start = dst.len();
    let body = request.body();
    dst.reserve(64 + request.target().len() + body.len());

    dst.put_slice(request.method().as_str().as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(request.target().as_bytes());
    dst.put_slice(b" HTTP/1.1\r\n");

    if request.header(&HOST).is_none() {
        put_header(dst, HOST.as_str().as_bytes(), ctx.authority.as_bytes());
    }

    for (name, value) in request.headers() {
        if close && name == CONNECTION {
            continue;
        }
        put_header(dst, name.as_str().as_bytes(), value.as_bytes());
    }

    if let Some(agent) = &ctx.user_agent {
        if request.header(&USER_AGENT).is_none() {
            put_header(dst, USER_AGENT.as_str().as_bytes(), agent.as_bytes());
        }
    }

    let framed =
        request.header(&CONTENT_LENGTH).is_some() || request.header(&TRANSFER_ENCODING).is_some();
    if !body.is_empty() && !framed {
        put_header(
            dst,
            CONTENT_LENGTH.as_str().as_bytes(),
            body.len().to_string().as_bytes(),
        );
    }

    if close {
        put_header(dst, CONNECTION.as_str().as_bytes(), b"close");
    }

    dst.put_slice(b"\r\n");
    dst.put_slice(body);
    dst.len() - start
}

#[inline]
fn put_header(dst: &mut BytesMut, name: &[u8], value: &[u8]) {
    dst.put_slice(name);
    dst.put_slice(b": ");
    dst.put_slice(value);
    dst.put_slice(b"\r\n");
}
