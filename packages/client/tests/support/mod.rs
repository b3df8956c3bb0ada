//! Scripted HTTP/1.1 peers for integration tests
//!
//! A `Scripted` peer parses requests off a stream and asks a closure what to
//! do with each one. The same script can serve real TCP connections
//! (`MockServer`) or in-memory ones (`DuplexConnector`).

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hpipe_client::connect::Connector;
use hpipe_client::{PipelineConfig, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    /// 1-based connection number
    pub connection: usize,
    /// 0-based position on its connection
    pub position: usize,
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the peer does with one request.
pub enum Reply {
    /// Write these bytes
    Send(Vec<u8>),
    /// Stop writing, keep reading until the client goes away
    Close,
    /// Write these bytes, then close as with `Close`
    SendAndClose(Vec<u8>),
    /// Write nothing for this request
    Silence,
}

type Script = dyn Fn(&SeenRequest) -> Reply + Send + Sync;

#[derive(Clone)]
pub struct Scripted {
    script: Arc<Script>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    connections: Arc<AtomicUsize>,
}

impl Scripted {
    pub fn new(script: impl Fn(&SeenRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
            seen: Arc::new(Mutex::new(Vec::new())),
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub async fn serve<S>(self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let connection = self.connections.fetch_add(1, Ordering::SeqCst) + 1;
        let mut buf = Vec::new();
        let mut chunk = vec![0u8; 16 * 1024];
        let mut position = 0;

        loop {
            while let Some((request, used)) = parse_request(&buf, connection, position) {
                buf.drain(..used);
                position += 1;
                self.seen.lock().unwrap().push(request.clone());
                let close = match (self.script)(&request) {
                    Reply::Send(bytes) => {
                        if stream.write_all(&bytes).await.is_err() {
                            return;
                        }
                        false
                    }
                    Reply::SendAndClose(bytes) => {
                        if stream.write_all(&bytes).await.is_err() {
                            return;
                        }
                        true
                    }
                    Reply::Silence => false,
                    Reply::Close => true,
                };
                if close {
                    // FIN first, then drain so the kernel never answers
                    // unread requests with a reset.
                    let _ = stream.shutdown().await;
                    while let Ok(n) = stream.read(&mut chunk).await {
                        if n == 0 {
                            break;
                        }
                    }
                    return;
                }
            }

            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
    }
}

fn parse_request(buf: &[u8], connection: usize, position: usize) -> Option<(SeenRequest, usize)> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut request = httparse::Request::new(&mut headers);
    let head_len = match request.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return None,
        Err(e) => panic!("client sent a malformed request: {e}"),
    };

    let headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();
    let body_len: usize = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or(0);
    if buf.len() < head_len + body_len {
        return None;
    }

    let seen = SeenRequest {
        connection,
        position,
        method: request.method.unwrap_or_default().to_string(),
        target: request.path.unwrap_or_default().to_string(),
        headers,
    };
    Some((seen, head_len + body_len))
}

/// Scripted peer behind a real TCP listener on 127.0.0.1.
pub struct MockServer {
    pub addr: SocketAddr,
    pub scripted: Scripted,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(scripted: Scripted) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let acceptor = scripted.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(acceptor.clone().serve(stream));
            }
        });
        Self {
            addr,
            scripted,
            task,
        }
    }

    /// Config pointing at this server with test-friendly backoff.
    pub fn config(&self) -> PipelineConfig {
        fast_config(self.addr.port())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Connector handing out in-memory streams served by a script.
pub struct DuplexConnector {
    pub scripted: Scripted,
}

impl Connector for DuplexConnector {
    type Io = DuplexStream;

    async fn connect(&self) -> Result<DuplexStream> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(self.scripted.clone().serve(server));
        Ok(client)
    }

    fn endpoint(&self) -> String {
        "duplex".to_string()
    }
}

pub fn fast_config(port: u16) -> PipelineConfig {
    PipelineConfig::new("127.0.0.1")
        .with_port(port)
        .with_backoff_base(Duration::from_millis(1))
        .with_read_timeout(Duration::from_secs(5))
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn head_ok(content_length: u64) -> Vec<u8> {
    format!("HTTP/1.1 200 OK\r\nContent-Length: {content_length}\r\n\r\n").into_bytes()
}

pub fn ok_body(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

pub fn status(code: u16, reason: &str) -> Vec<u8> {
    format!("HTTP/1.1 {code} {reason}\r\nContent-Length: 0\r\n\r\n").into_bytes()
}

pub fn chunked(parts: &[&str]) -> Vec<u8> {
    let mut out = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    for part in parts {
        out.extend_from_slice(format!("{:x}\r\n{part}\r\n", part.len()).as_bytes());
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}
