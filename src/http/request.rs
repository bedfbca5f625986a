/// Request methods understood by the protocol.
///
/// Only retrieval is supported; any other token on the request line is
/// rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
}

/// Protocol version carried on every request and status line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

impl Method {
    /// Parses a method token, ignoring ASCII case.
    ///
    /// # Example
    ///
    /// ```
    /// # use fetchline::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token("get"), Some(Method::GET));
    /// assert_eq!(Method::from_token("POST"), None);
    /// ```
    pub fn from_token(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("GET") {
            Some(Method::GET)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

/// A validated request line.
///
/// Values only come out of [`crate::http::parser::parse_request_line`] or
/// [`Request::get`], so a `Request` is always well formed. Fields are
/// read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    version: String,
}

impl Request {
    pub(crate) fn new(method: Method, path: String, version: String) -> Self {
        Self { method, path, version }
    }

    /// Builds an outgoing retrieval request for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path.into(), HTTP_VERSION.to_string())
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The resource path (everything between the method and version tokens).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Serializes the request as sent by a client session.
    ///
    /// The `Connection: Keep-Alive` line is advisory; connections are never
    /// reused.
    pub fn serialize(&self, host: &str) -> String {
        format!(
            "{} {} {}\nHost: {}\nConnection: Keep-Alive",
            self.method.as_str(),
            self.path,
            self.version,
            host
        )
    }
}
