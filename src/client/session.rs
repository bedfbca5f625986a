//! One-shot client side of the protocol.
//!
//! A session owns its socket for exactly one request/response exchange and
//! closes it afterwards, whatever the outcome.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::http::parser::parse_status_line;
use crate::http::reader::LineReader;
use crate::http::request::Request;

/// What a single fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The session was already closed; nothing was sent.
    Skipped,
    /// Server answered with a non-200 status.
    Failed { code: u16, message: String },
    /// Server answered 200; `body` holds the non-blank lines received.
    Delivered {
        content_type: Option<String>,
        body: Vec<String>,
    },
}

pub struct ClientSession {
    reader: Option<LineReader<TcpStream>>,
    server_addr: SocketAddr,
    timeout: Duration,
}

impl ClientSession {
    /// Connects to `host:port`. `timeout_after` bounds the connect and every read.
    pub async fn connect(host: &str, port: u16, timeout_after: Duration) -> Result<Self> {
        let stream = timeout(timeout_after, TcpStream::connect((host, port)))
            .await
            .with_context(|| format!("Timed out connecting to {}:{}", host, port))?
            .with_context(|| format!("Failed to connect to {}:{}", host, port))?;

        let server_addr = stream.peer_addr().context("Connected socket has no peer")?;
        debug!(server = %server_addr, "Connected");

        Ok(Self {
            reader: Some(LineReader::new(stream, timeout_after)),
            server_addr,
            timeout: timeout_after,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Requests `path` and reads the response.
    ///
    /// A closed session returns [`FetchOutcome::Skipped`]. Otherwise the
    /// socket is closed before returning, on success and on error alike.
    pub async fn fetch(&mut self, path: &str) -> Result<FetchOutcome> {
        let Some(mut reader) = self.reader.take() else {
            return Ok(FetchOutcome::Skipped);
        };

        let result = self.exchange(&mut reader, path).await;

        let _ = reader.get_mut().shutdown().await;
        drop(reader);
        info!(server = %self.server_addr, "Connection closed");

        result
    }

    /// Closes the socket without sending anything. Idempotent.
    pub fn close(&mut self) {
        self.reader.take();
    }

    async fn exchange(&self, reader: &mut LineReader<TcpStream>, path: &str) -> Result<FetchOutcome> {
        let host = self.server_addr.ip().to_string();
        let mut request = Request::get(path).serialize(&host);
        request.push('\n');

        reader
            .get_mut()
            .write_all(request.as_bytes())
            .await
            .context("Failed to send request")?;

        let status_line = reader
            .next_line()
            .await
            .context("Failed to read response")?
            .context("Server closed the connection without responding")?;

        let (code, message) = parse_status_line(&status_line)?;
        if code != 200 {
            error!(code, message = %message, "Fail while loading content");
            return Ok(FetchOutcome::Failed { code, message });
        }

        info!(path = %path, "Content successfully received");

        let mut content_type = None;
        while let Some(line) = reader.next_line().await? {
            if line.trim().is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("Content-Type") {
                    content_type = Some(value.trim().to_string());
                }
            }
        }

        let mut body = Vec::new();
        while let Some(line) = reader.next_line().await? {
            if line.trim().is_empty() {
                break;
            }
            body.push(line);
        }

        Ok(FetchOutcome::Delivered { content_type, body })
    }
}
