use std::fmt;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::http::parser::parse_request_line;
use crate::http::reader::{LineReader, ReadError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::resolver::{Resolution, Resolver};

/// Timing knobs for one connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Upper bound on each read from the peer.
    pub read_timeout: Duration,
    /// Pause before teardown, spent draining unread request lines.
    pub grace_delay: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            grace_delay: Duration::from_millis(100),
        }
    }
}

/// Why a request could not be read from the peer.
#[derive(Debug)]
pub enum ConnectionError {
    /// Stream ended before a request line arrived.
    NoMessages,
    /// Peer tore the connection down before the request was read.
    ConnectionClosed,
    /// Timeout, overlong line or other stream failure.
    Read(ReadError),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::NoMessages => write!(f, "No messages received"),
            ConnectionError::ConnectionClosed => write!(f, "Connection closed"),
            ConnectionError::Read(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConnectionError {}

pub enum ConnectionState {
    ReadingRequest,
    Resolving(Request),
    WritingResponse(ResponseWriter),
    Closing,
    Closed,
}

/// Serves exactly one request on an accepted stream.
///
/// ```text
/// ReadingRequest ──► Resolving ──► WritingResponse ──► Closing ──► Closed
///        │                               ▲
///        └── unreadable / invalid ───────┘ (500)
/// ```
///
/// `Closing` is reached on every path. Nothing that goes wrong inside a
/// connection is returned to the caller except a failed response write,
/// which is reported only after the stream has been shut down.
pub struct Connection<S> {
    reader: LineReader<S>,
    peer: SocketAddr,
    resolver: Arc<dyn Resolver>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        resolver: Arc<dyn Resolver>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            reader: LineReader::new(stream, settings.read_timeout),
            peer,
            resolver,
            settings,
            state: ConnectionState::ReadingRequest,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut write_failure = None;

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::ReadingRequest => {
                    self.state = match self.read_request().await {
                        Ok(line) => match parse_request_line(&line) {
                            Ok(req) => ConnectionState::Resolving(req),
                            Err(e) => {
                                warn!(peer = %self.peer, error = %e, "Rejected request line");
                                Self::respond(&Response::server_error())
                            }
                        },
                        Err(ConnectionError::ConnectionClosed) => {
                            warn!(peer = %self.peer, "Connection closed before request");
                            ConnectionState::Closing
                        }
                        Err(e) => {
                            warn!(peer = %self.peer, error = %e, "Failed to read request");
                            Self::respond(&Response::server_error())
                        }
                    };
                }

                ConnectionState::Resolving(req) => {
                    let response = self.resolve(&req).await;
                    self.state = Self::respond(&response);
                }

                ConnectionState::WritingResponse(mut writer) => {
                    if let Err(e) = writer.write_to_stream(self.reader.get_mut()).await {
                        write_failure = Some(e);
                    }
                    self.state = ConnectionState::Closing;
                }

                ConnectionState::Closing => {
                    self.close().await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }

        match write_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn respond(response: &Response) -> ConnectionState {
        ConnectionState::WritingResponse(ResponseWriter::new(response))
    }

    async fn read_request(&mut self) -> Result<String, ConnectionError> {
        match self.reader.next_line().await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(ConnectionError::NoMessages),
            Err(ReadError::Io(e)) if is_teardown(e.kind()) => Err(ConnectionError::ConnectionClosed),
            Err(e) => Err(ConnectionError::Read(e)),
        }
    }

    async fn resolve(&self, request: &Request) -> Response {
        let path = request.path().to_string();
        info!(peer = %self.peer, path = %path, "Resource requested");

        let resolver = Arc::clone(&self.resolver);
        let lookup = path.clone();
        match tokio::task::spawn_blocking(move || resolver.resolve(&lookup)).await {
            Ok(Ok(Resolution::Found(content))) => {
                info!(peer = %self.peer, path = %path, bytes = content.len(), "Responding");
                Response::ok(content)
            }
            Ok(Ok(Resolution::NotFound)) => {
                info!(peer = %self.peer, path = %path, "Resource not found");
                Response::not_found()
            }
            Ok(Err(e)) => {
                warn!(peer = %self.peer, path = %path, error = %e, "Resource lookup failed");
                Response::server_error()
            }
            Err(e) => {
                warn!(peer = %self.peer, path = %path, error = %e, "Resource lookup aborted");
                Response::server_error()
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.reader.get_mut().shutdown().await {
            debug!(peer = %self.peer, error = %e, "Shutdown failed");
        }
        self.reader.drain_for(self.settings.grace_delay).await;
        info!(peer = %self.peer, "Disconnected");
    }
}

fn is_teardown(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::resolver::MemoryResolver;
    use tokio::io::{AsyncReadExt, duplex};

    async fn exchange(request: &[u8]) -> String {
        let (mut client, server) = duplex(1024);
        let resolver: Arc<dyn Resolver> =
            Arc::new(MemoryResolver::new().with("./data/hello.txt", "hi"));
        let settings = ConnectionSettings {
            read_timeout: Duration::from_millis(200),
            grace_delay: Duration::from_millis(20),
        };
        let conn = Connection::new(server, "127.0.0.1:9".parse().unwrap(), resolver, settings);
        let task = tokio::spawn(conn.run());

        client.write_all(request).await.unwrap();
        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        drop(client);
        task.await.unwrap().unwrap();
        out
    }

    #[tokio::test]
    async fn serves_known_resource() {
        let out = exchange(b"GET ./data/hello.txt HTTP/1.1\nHost: x\n").await;
        assert_eq!(out, "HTTP/1.1 200 OK\nContent-Type: text/plain\n\nhi\n");
    }

    #[tokio::test]
    async fn unknown_resource_is_404_without_body() {
        let out = exchange(b"GET ./missing.txt HTTP/1.1\n").await;
        assert_eq!(out, "HTTP/1.1 404 Not Found\n");
    }

    #[tokio::test]
    async fn invalid_method_is_server_error() {
        let out = exchange(b"POST /x HTTP/1.1\n").await;
        assert_eq!(out, "HTTP/1.1 500 Server Error\n");
    }
}
