//! Streaming HTTP/1.x response decoding
//!
//! `decode_response` is a pure function over the bytes buffered so far: it
//! either yields one complete response and how many bytes it used, or asks
//! for more input. `ResponseDecoder` owns the read buffer of one round and
//! feeds the socket into it under the read timeout.
//!
//! Framing follows RFC 9112 section 6.3 for responses: no body for HEAD,
//! 1xx, 204 and 304; chunked wins over `Content-Length`; otherwise the body
//! runs until the server closes the connection.

use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};
use httparse::Status;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{self, Result};
use crate::http::PipelineResponse;
use crate::telemetry::PipelineStats;

/// Size ceilings applied while decoding.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    pub max_headers: usize,
    pub max_head_size: usize,
    pub max_body_size: usize,
}

/// Result of one decode attempt.
#[derive(Debug)]
pub enum Decoded {
    /// A full response and the number of buffered bytes it occupied,
    /// including any skipped interim responses
    Complete(PipelineResponse, usize),
    /// More input is needed
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    Empty,
    Length(u64),
    Chunked,
    UntilClose,
}

/// Head of a response whose body is still arriving.
#[derive(Debug)]
struct PartialResponse {
    response: PipelineResponse,
    framing: BodyFraming,
    /// Buffered bytes before the body: skipped interim responses and the head
    body_start: usize,
    chunked: ChunkedBody,
}

impl PartialResponse {
    /// Body and its length in bytes once fully buffered.
    fn body(&mut self, buf: &[u8], eof: bool, limits: &DecodeLimits) -> Result<Option<(Bytes, usize)>> {
        let rest = &buf[self.body_start..];
        match self.framing {
            BodyFraming::Empty => Ok(Some((Bytes::new(), 0))),
            BodyFraming::Length(len) => {
                if len > limits.max_body_size as u64 {
                    return Err(error::payload_too_large(len, limits.max_body_size));
                }
                // Bounded by max_body_size above.
                let len = len as usize;
                if rest.len() < len {
                    return Ok(None);
                }
                Ok(Some((Bytes::copy_from_slice(&rest[..len]), len)))
            }
            BodyFraming::Chunked => self.chunked.resume(rest, limits.max_body_size),
            BodyFraming::UntilClose => {
                if rest.len() > limits.max_body_size {
                    return Err(error::payload_too_large(
                        rest.len() as u64,
                        limits.max_body_size,
                    ));
                }
                if !eof {
                    return Ok(None);
                }
                Ok(Some((Bytes::copy_from_slice(rest), rest.len())))
            }
        }
    }
}

/// Decode the next response from `buf`.
///
/// `head_request` suppresses the body whatever the headers say. `eof` tells
/// the decoder the peer has closed, which completes an until-close body.
///
/// # Errors
///
/// `Kind::Parse` for malformed framing or an unexpected `101`,
/// `Kind::PayloadTooLarge` for a body over `max_body_size`.
pub fn decode_response(
    buf: &[u8],
    head_request: bool,
    eof: bool,
    limits: &DecodeLimits,
) -> Result<Decoded> {
    decode_step(buf, head_request, eof, limits, &mut Vec::new(), &mut None)
}

/// One decode attempt that resumes from `pending` and leaves its progress
/// there when more input is needed.
fn decode_step(
    buf: &[u8],
    head_request: bool,
    eof: bool,
    limits: &DecodeLimits,
    header_slots: &mut Vec<httparse::Header<'static>>,
    pending: &mut Option<PartialResponse>,
) -> Result<Decoded> {
    let mut partial = match pending.take() {
        Some(partial) => partial,
        None => {
            let mut slots = recycle(std::mem::take(header_slots));
            slots.resize(limits.max_headers, httparse::EMPTY_HEADER);
            let parsed = parse_head(buf, head_request, limits, &mut slots);
            *header_slots = recycle(slots);
            match parsed? {
                Some(partial) => partial,
                None => return Ok(Decoded::Incomplete),
            }
        }
    };

    match partial.body(buf, eof, limits)? {
        Some((body, used)) => {
            partial.response.body = body;
            Ok(Decoded::Complete(partial.response, partial.body_start + used))
        }
        None => {
            *pending = Some(partial);
            Ok(Decoded::Incomplete)
        }
    }
}

/// Hand a header slot allocation over to a buffer of another lifetime.
fn recycle<'a, 'b>(slots: Vec<httparse::Header<'a>>) -> Vec<httparse::Header<'b>> {
    slots.into_iter().map(|_| httparse::EMPTY_HEADER).collect()
}

fn parse_head<'b>(
    buf: &'b [u8],
    head_request: bool,
    limits: &DecodeLimits,
    slots: &mut [httparse::Header<'b>],
) -> Result<Option<PartialResponse>> {
    let mut offset = 0;

    loop {
        let slice = &buf[offset..];
        let mut parsed = httparse::Response::new(&mut *slots);

        let head_len = match parsed.parse(slice) {
            Ok(Status::Complete(len)) => len,
            Ok(Status::Partial) => {
                if slice.len() > limits.max_head_size {
                    return Err(error::parse(format!(
                        "response head exceeds {} bytes",
                        limits.max_head_size
                    )));
                }
                return Ok(None);
            }
            Err(e) => return Err(error::parse(e)),
        };

        if head_len > limits.max_head_size {
            return Err(error::parse(format!(
                "response head exceeds {} bytes",
                limits.max_head_size
            )));
        }

        let code = parsed
            .code
            .ok_or_else(|| error::parse("status line without a code"))?;
        if code == 101 {
            return Err(error::parse("unexpected 101 Switching Protocols"));
        }
        if (100..200).contains(&code) {
            tracing::trace!(status = code, "skipping interim response");
            offset += head_len;
            continue;
        }

        let status = StatusCode::from_u16(code).map_err(error::parse)?;
        let version = match parsed.version {
            Some(0) => Version::HTTP_10,
            _ => Version::HTTP_11,
        };
        let reason = parsed.reason.unwrap_or_default().to_string();

        let mut headers = HeaderMap::with_capacity(parsed.headers.len());
        for header in parsed.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(error::parse)?;
            let value = HeaderValue::from_bytes(header.value).map_err(error::parse)?;
            headers.append(name, value);
        }

        let framing = body_framing(code, head_request, &headers)?;
        return Ok(Some(PartialResponse {
            response: PipelineResponse {
                status,
                reason,
                version,
                headers,
                body: Bytes::new(),
            },
            framing,
            body_start: offset + head_len,
            chunked: ChunkedBody::default(),
        }));
    }
}

fn body_framing(status: u16, head_request: bool, headers: &HeaderMap) -> Result<BodyFraming> {
    if head_request || status == 204 || status == 304 {
        return Ok(BodyFraming::Empty);
    }

    if headers.contains_key(TRANSFER_ENCODING) {
        let last = headers
            .get_all(TRANSFER_ENCODING)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|coding| !coding.is_empty())
            .last();
        return Ok(match last {
            Some(coding) if coding.eq_ignore_ascii_case("chunked") => BodyFraming::Chunked,
            _ => BodyFraming::UntilClose,
        });
    }

    let mut declared: Option<u64> = None;
    for value in headers.get_all(CONTENT_LENGTH) {
        let text = value
            .to_str()
            .map_err(|_| error::parse("non-ASCII Content-Length"))?;
        for part in text.split(',') {
            let len: u64 = part
                .trim()
                .parse()
                .map_err(|_| error::parse(format!("invalid Content-Length {text:?}")))?;
            match declared {
                Some(existing) if existing != len => {
                    return Err(error::parse("conflicting Content-Length values"));
                }
                _ => declared = Some(len),
            }
        }
    }

    Ok(match declared {
        Some(0) => BodyFraming::Empty,
        Some(len) => BodyFraming::Length(len),
        None => BodyFraming::UntilClose,
    })
}

/// Chunked body decoded so far.
///
/// `pos` always sits on a chunk-size line or, once the last chunk was seen,
/// on a trailer line, so every buffered byte is walked once.
#[derive(Debug, Default)]
struct ChunkedBody {
    pos: usize,
    body: BytesMut,
    in_trailers: bool,
}

impl ChunkedBody {
    /// Continue decoding the chunked body at the start of `buf`.
    ///
    /// Returns `None` until the terminating chunk and trailer section are
    /// buffered. Trailers are consumed and discarded.
    fn resume(&mut self, buf: &[u8], max_body: usize) -> Result<Option<(Bytes, usize)>> {
        loop {
            if self.in_trailers {
                let Some(line_end) = find_crlf(&buf[self.pos..]) else {
                    return Ok(None);
                };
                self.pos += line_end + 2;
                if line_end == 0 {
                    let body = std::mem::take(&mut self.body).freeze();
                    return Ok(Some((body, self.pos)));
                }
                continue;
            }

            let (line_len, size) = match httparse::parse_chunk_size(&buf[self.pos..]) {
                Ok(Status::Complete(parsed)) => parsed,
                Ok(Status::Partial) => return Ok(None),
                Err(_) => return Err(error::parse("invalid chunk size line")),
            };

            if size == 0 {
                self.pos += line_len;
                self.in_trailers = true;
                continue;
            }

            let total = self.body.len() as u64 + size;
            if total > max_body as u64 {
                return Err(error::payload_too_large(total, max_body));
            }
            let size = size as usize;
            let data = self.pos + line_len;
            if buf.len() < data + size + 2 {
                return Ok(None);
            }
            if &buf[data + size..data + size + 2] != b"\r\n" {
                return Err(error::parse("chunk data not terminated by CRLF"));
            }
            self.body.extend_from_slice(&buf[data..data + size]);
            self.pos = data + size + 2;
        }
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|window| window == b"\r\n")
}

/// Read buffer of one round plus the logic to refill it.
///
/// Decoding progress of a response that spans several reads is kept
/// between calls, so a large body is walked once rather than once per read.
#[derive(Debug)]
pub struct ResponseDecoder {
    buf: BytesMut,
    read_size: usize,
    limits: DecodeLimits,
    eof: bool,
    header_slots: Vec<httparse::Header<'static>>,
    pending: Option<PartialResponse>,
}

impl ResponseDecoder {
    pub fn new(read_size: usize, limits: DecodeLimits) -> Self {
        Self {
            buf: BytesMut::with_capacity(read_size),
            read_size,
            limits,
            eof: false,
            header_slots: vec![httparse::EMPTY_HEADER; limits.max_headers],
            pending: None,
        }
    }

    /// Whether the peer has closed its side.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Bytes received but not yet part of a matched response.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Read until one full response is buffered, then return it.
    ///
    /// Each socket read gets its own `read_timeout`, so a slow but steady
    /// stream of a large body does not time out.
    ///
    /// # Errors
    ///
    /// Decode errors as in [`decode_response`], `Kind::Timeout` when a read
    /// makes no progress in time, `Kind::PrematureClose` when the peer
    /// closes between responses, and `Kind::Parse` when it closes in the
    /// middle of one, since the declared framing no longer matches the
    /// stream.
    pub async fn next_response<R>(
        &mut self,
        reader: &mut R,
        head_request: bool,
        read_timeout: Duration,
        stats: &PipelineStats,
    ) -> Result<PipelineResponse>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let decoded = decode_step(
                &self.buf,
                head_request,
                self.eof,
                &self.limits,
                &mut self.header_slots,
                &mut self.pending,
            )?;
            if let Decoded::Complete(response, used) = decoded {
                self.buf.advance(used);
                return Ok(response);
            }

            if self.eof {
                return Err(if self.buf.is_empty() {
                    error::premature_close()
                } else {
                    error::incomplete_message()
                });
            }

            self.buf.reserve(self.read_size);
            let read = tokio::time::timeout(read_timeout, reader.read_buf(&mut self.buf)).await;
            match read {
                Ok(Ok(0)) => self.eof = true,
                Ok(Ok(n)) => stats.record_read(n),
                Ok(Err(e)) => return Err(error::connection_lost(e)),
                Err(_) => return Err(error::timed_out()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    const LIMITS: DecodeLimits = DecodeLimits {
        max_headers: 16,
        max_head_size: 1024,
        max_body_size: 64,
    };

    fn complete(buf: &[u8], head: bool, eof: bool) -> (PipelineResponse, usize) {
        match decode_response(buf, head, eof, &LIMITS).unwrap() {
            Decoded::Complete(response, used) => (response, used),
            Decoded::Incomplete => panic!("expected a complete response"),
        }
    }

    fn incomplete(buf: &[u8], head: bool) -> bool {
        matches!(
            decode_response(buf, head, false, &LIMITS).unwrap(),
            Decoded::Incomplete
        )
    }

    #[test]
    fn head_response_has_no_body_despite_content_length() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 12345\r\n\r\nHTTP/1.1 200 OK\r\n";
        let (response, used) = complete(raw, true, false);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_length(), Some(12345));
        assert!(response.body.is_empty());
        assert_eq!(used, raw.len() - "HTTP/1.1 200 OK\r\n".len());
    }

    #[test]
    fn content_length_body_waits_for_all_bytes() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhel";
        assert!(incomplete(raw, false));

        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhelloHTTP";
        let (response, used) = complete(raw, false, false);
        assert_eq!(&response.body[..], b"hello");
        assert_eq!(used, raw.len() - 4);
    }

    #[test]
    fn chunked_body_with_extensions_and_trailers() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                    4;ext=1\r\nWiki\r\n5\r\npedia\r\n0\r\nX-Trailer: t\r\n\r\n";
        let (response, used) = complete(raw, false, false);
        assert_eq!(&response.body[..], b"Wikipedia");
        assert_eq!(used, raw.len());
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\
                    Transfer-Encoding: chunked\r\n\r\n2\r\nok\r\n0\r\n\r\n";
        let (response, _) = complete(raw, false, false);
        assert_eq!(&response.body[..], b"ok");
    }

    #[test]
    fn partial_chunked_body_is_incomplete() {
        assert!(incomplete(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWi",
            false
        ));
        assert!(incomplete(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n",
            false
        ));
    }

    #[test]
    fn chunked_progress_is_kept_between_reads() {
        let wire = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut chunked = ChunkedBody::default();

        assert!(chunked.resume(&wire[..12], 64).unwrap().is_none());
        assert_eq!(&chunked.body[..], b"Wiki");
        assert_eq!(chunked.pos, 9);

        assert!(chunked.resume(&wire[..21], 64).unwrap().is_none());
        assert_eq!(&chunked.body[..], b"Wikipedia");
        assert!(!chunked.in_trailers);

        let (body, used) = chunked.resume(wire, 64).unwrap().unwrap();
        assert_eq!(&body[..], b"Wikipedia");
        assert_eq!(used, wire.len());
    }

    #[test]
    fn parsed_head_is_reused_while_body_arrives() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n3\r\ndef\r\n0\r\n\r\n";
        let mut slots = Vec::new();
        let mut pending = None;

        let step = decode_step(&raw[..raw.len() - 10], false, false, &LIMITS, &mut slots, &mut pending);
        assert!(matches!(step.unwrap(), Decoded::Incomplete));
        let partial = pending.as_ref().unwrap();
        assert_eq!(partial.framing, BodyFraming::Chunked);
        assert_eq!(&partial.chunked.body[..], b"abc");
        assert_eq!(slots.len(), LIMITS.max_headers);

        match decode_step(raw, false, false, &LIMITS, &mut slots, &mut pending).unwrap() {
            Decoded::Complete(response, used) => {
                assert_eq!(&response.body[..], b"abcdef");
                assert_eq!(used, raw.len());
            }
            Decoded::Incomplete => panic!("expected a complete response"),
        }
        assert!(pending.is_none());
    }

    #[tokio::test]
    async fn chunked_body_trickles_in_over_many_reads() {
        let (mut client, mut server) = tokio::io::duplex(8);
        let limits = DecodeLimits {
            max_body_size: 1 << 16,
            ..LIMITS
        };
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            server
                .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
                .await
                .unwrap();
            for _ in 0..500 {
                server.write_all(b"5\r\nhello\r\n").await.unwrap();
            }
            server.write_all(b"0\r\n\r\n").await.unwrap();
        });

        let mut decoder = ResponseDecoder::new(8, limits);
        let stats = PipelineStats::default();
        let response = decoder
            .next_response(&mut client, false, Duration::from_secs(5), &stats)
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(response.body.len(), 2500);
        assert!(response.body.starts_with(b"hellohello"));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn interim_responses_are_skipped() {
        let raw = b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n";
        let (response, used) = complete(raw, false, false);
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(used, raw.len());
    }

    #[test]
    fn switching_protocols_is_a_desync() {
        let err = decode_response(b"HTTP/1.1 101 Switching Protocols\r\n\r\n", false, false, &LIMITS)
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Parse);
    }

    #[test]
    fn until_close_body_completes_at_eof() {
        let raw = b"HTTP/1.0 200 OK\r\n\r\nstreamed";
        assert!(incomplete(raw, false));
        let (response, used) = complete(raw, false, true);
        assert_eq!(&response.body[..], b"streamed");
        assert_eq!(response.version, Version::HTTP_10);
        assert_eq!(used, raw.len());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = decode_response(b"garbage\r\n\r\n", false, false, &LIMITS).unwrap_err();
        assert!(err.is_desync());
        assert!(err.is_retryable());
    }

    #[test]
    fn conflicting_content_length_is_rejected() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\nContent-Length: 4\r\n\r\nabcd";
        assert_eq!(
            decode_response(raw, false, false, &LIMITS).unwrap_err().kind(),
            Kind::Parse
        );
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 3, 3\r\n\r\nabc";
        assert_eq!(&complete(raw, false, false).0.body[..], b"abc");
    }

    #[test]
    fn oversized_bodies_are_rejected_early() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 65\r\n\r\n";
        let err = decode_response(raw, false, false, &LIMITS).unwrap_err();
        assert_eq!(err.kind(), Kind::PayloadTooLarge);
        assert!(!err.is_retryable());
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut raw = b"HTTP/1.1 200 OK\r\n".to_vec();
        raw.extend(std::iter::repeat_n(b'a', 2048));
        assert!(decode_response(&raw, false, false, &LIMITS).unwrap_err().is_desync());
    }

    #[tokio::test]
    async fn decoder_reads_back_to_back_responses() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let stats = PipelineStats::default();
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            server
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nokHTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let mut decoder = ResponseDecoder::new(16, LIMITS);
        let timeout = Duration::from_secs(5);
        let first = decoder
            .next_response(&mut client, false, timeout, &stats)
            .await
            .unwrap();
        let second = decoder
            .next_response(&mut client, false, timeout, &stats)
            .await
            .unwrap();
        assert_eq!(&first.body[..], b"ok");
        assert_eq!(second.status, StatusCode::NOT_FOUND);
        writer.await.unwrap();

        let err = decoder
            .next_response(&mut client, false, timeout, &stats)
            .await
            .unwrap_err();
        assert!(err.is_closed());
        assert_eq!(decoder.buffered(), 0);
    }

    #[tokio::test]
    async fn truncated_response_is_a_framing_error() {
        let (mut client, server) = tokio::io::duplex(64);
        {
            let mut server = server;
            use tokio::io::AsyncWriteExt;
            server
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc")
                .await
                .unwrap();
        }
        let mut decoder = ResponseDecoder::new(16, LIMITS);
        let stats = PipelineStats::default();
        let err = decoder
            .next_response(&mut client, false, Duration::from_secs(5), &stats)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Parse);
        assert!(err.is_retryable());
        assert!(!err.is_closed());
        assert!(decoder.is_eof());
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (mut client, _server) = tokio::io::duplex(64);
        let mut decoder = ResponseDecoder::new(16, LIMITS);
        let stats = PipelineStats::default();
        let err = decoder
            .next_response(&mut client, false, Duration::from_millis(20), &stats)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
