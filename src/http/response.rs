/// Status codes emitted by the server.
///
/// - `Ok` (200): resource found, body follows
/// - `NotFound` (404): resource absent or not a regular file
/// - `ServerError` (500): request could not be read, validated or resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Server Error
    ServerError,
}

impl StatusCode {
    /// Returns the numeric status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use fetchline::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::ServerError => 500,
        }
    }

    /// Returns the reason phrase written after the code.
    ///
    /// # Example
    ///
    /// ```
    /// # use fetchline::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::ServerError.reason_phrase(), "Server Error");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::ServerError => "Server Error",
        }
    }
}

/// Content type used for every resolved resource.
pub const TEXT_PLAIN: &str = "text/plain";

/// A response ready to be serialized once and written to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl Response {
    /// 200 OK carrying `body` as `text/plain`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: Some(TEXT_PLAIN.to_string()),
            body: Some(body.into()),
        }
    }

    /// Replaces the content type of a success response.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// 404 Not Found, no body.
    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    /// 500 Server Error, no body.
    pub fn server_error() -> Self {
        Self::error(StatusCode::ServerError)
    }

    fn error(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: None,
        }
    }

    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn reason(&self) -> &'static str {
        self.status.reason_phrase()
    }
}
