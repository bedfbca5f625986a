use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::HTTP_VERSION;
use crate::http::response::{Response, StatusCode};

/// Serializes a response into its wire form.
///
/// Success: status line, `Content-Type`, blank separator, body.
/// Errors: the status line alone. Every form ends with a line terminator.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut text = format!(
        "{} {} {}",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );

    if resp.status == StatusCode::Ok {
        if let Some(content_type) = &resp.content_type {
            text.push_str("\nContent-Type: ");
            text.push_str(content_type);
        }
        text.push_str("\n\n");
        if let Some(body) = &resp.body {
            text.push_str(body);
        }
    }

    text.push('\n');
    text.into_bytes()
}

/// Holds a serialized response and writes it out exactly once.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.written == self.buffer.len()
    }

    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> anyhow::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
