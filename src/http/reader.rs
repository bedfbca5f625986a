//! Timeout-bounded line reading shared by the server and client sides.

use std::fmt;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// Initial buffer capacity.
const BUFFER_SIZE: usize = 4096;

/// Longest line accepted before the peer is considered misbehaving.
pub const MAX_LINE_LEN: usize = 8192;

/// Why the next line could not be read.
#[derive(Debug)]
pub enum ReadError {
    /// No data arrived within the read timeout.
    Timeout(Duration),
    /// A line grew past [`MAX_LINE_LEN`] without a terminator.
    LineTooLong,
    /// The underlying stream failed.
    Io(std::io::Error),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Timeout(d) => write!(f, "read timed out after {:?}", d),
            ReadError::LineTooLong => write!(f, "line exceeds {} bytes", MAX_LINE_LEN),
            ReadError::Io(e) => write!(f, "read failed: {}", e),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}

/// Reads `\n`-terminated lines from a stream, one at a time.
///
/// Every read from the underlying stream is bounded by `read_timeout` so a
/// stalled peer surfaces as [`ReadError::Timeout`] instead of hanging.
pub struct LineReader<S> {
    stream: S,
    buffer: BytesMut,
    read_timeout: Duration,
}

impl<S: AsyncRead + Unpin> LineReader<S> {
    pub fn new(stream: S, read_timeout: Duration) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(BUFFER_SIZE),
            read_timeout,
        }
    }

    /// Returns the next line without its terminator (`\n` or `\r\n`).
    ///
    /// `Ok(None)` means the stream ended with nothing left to return. A final
    /// unterminated fragment is returned as a line of its own.
    pub async fn next_line(&mut self) -> Result<Option<String>, ReadError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let raw = self.buffer.split_to(pos + 1);
                return Ok(Some(decode_line(&raw[..pos])));
            }

            if self.buffer.len() > MAX_LINE_LEN {
                return Err(ReadError::LineTooLong);
            }

            let limit = self.read_timeout;
            let n = timeout(limit, self.stream.read_buf(&mut self.buffer))
                .await
                .map_err(|_| ReadError::Timeout(limit))??;

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let rest = self.buffer.split();
                return Ok(Some(decode_line(&rest)));
            }
        }
    }

    /// Discards lines until the stream ends, errors, or `limit` elapses.
    pub async fn drain_for(&mut self, limit: Duration) {
        let _ = timeout(limit, async {
            while let Ok(Some(_)) = self.next_line().await {}
        })
        .await;
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
