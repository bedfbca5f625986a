use std::fmt;

use crate::http::request::{Method, Request};

/// Scheme prefix of the version token (`HTTP/1.1`).
const SCHEME_PREFIX: &str = "HTTP/";
const SUPPORTED_VERSION: &str = "1.1";

/// Why a request line or status line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Blank request line.
    InvalidRequest,
    /// First token is not the retrieval method.
    MethodInvalid(String),
    /// Last token does not start with the scheme prefix.
    SchemeInvalid(String),
    /// Version after the scheme prefix is not `1.1`.
    VersionInvalid(String),
    /// Status line missing a numeric code.
    MalformedResponse(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRequest => write!(f, "Invalid request"),
            ParseError::MethodInvalid(m) => write!(f, "Method invalid: {}", m),
            ParseError::SchemeInvalid(s) => write!(f, "Scheme invalid: {}", s),
            ParseError::VersionInvalid(v) => write!(f, "HTTP version invalid: {}", v),
            ParseError::MalformedResponse(l) => write!(f, "Malformed response line: {:?}", l),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one request line such as `GET ./data/hello.txt HTTP/1.1`.
///
/// Rules apply in order and the first failure wins: blank line, method,
/// scheme prefix, version. Tokens between the method and the version are
/// rejoined with single spaces to form the path.
pub fn parse_request_line(line: &str) -> Result<Request, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidRequest);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let first = tokens[0];
    let last = tokens[tokens.len() - 1];

    let method = Method::from_token(first)
        .ok_or_else(|| ParseError::MethodInvalid(first.to_string()))?;

    let has_scheme = last
        .get(..SCHEME_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME_PREFIX));
    if !has_scheme {
        return Err(ParseError::SchemeInvalid(last.to_string()));
    }

    // The prefix match ignores case, the version split does not: `http/1.1`
    // has no literal `HTTP/` to split on and fails as a whole token.
    let version = last.strip_prefix(SCHEME_PREFIX).unwrap_or(last);
    if version != SUPPORTED_VERSION {
        return Err(ParseError::VersionInvalid(version.to_string()));
    }

    // A lone `HTTP/1.1` token is both first and last; the method check above
    // has already rejected it, so there are at least two tokens here.
    let path = tokens[1..tokens.len() - 1].join(" ");

    Ok(Request::new(method, path, last.to_string()))
}

/// Decodes a status line into `(code, reason)`.
///
/// The reason is every token after the code rejoined with single spaces and
/// may be empty. A missing or non-numeric code is rejected rather than
/// guessed.
pub fn parse_status_line(line: &str) -> Result<(u16, String), ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let code = tokens
        .get(1)
        .and_then(|t| t.parse::<u16>().ok())
        .ok_or_else(|| ParseError::MalformedResponse(line.to_string()))?;

    Ok((code, tokens[2..].join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = parse_request_line("GET ./data/hello.txt HTTP/1.1").unwrap();

        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "./data/hello.txt");
        assert_eq!(req.version(), "HTTP/1.1");
    }

    #[test]
    fn method_checked_before_scheme() {
        let err = parse_request_line("POST /x FTP/1.1").unwrap_err();
        assert_eq!(err, ParseError::MethodInvalid("POST".to_string()));
    }

    #[test]
    fn lowercase_scheme_fails_on_version() {
        let err = parse_request_line("GET /x http/1.1").unwrap_err();
        assert_eq!(err, ParseError::VersionInvalid("http/1.1".to_string()));
    }

    #[test]
    fn status_line_with_multi_word_reason() {
        let (code, reason) = parse_status_line("HTTP/1.1 500 Server Error").unwrap();
        assert_eq!(code, 500);
        assert_eq!(reason, "Server Error");
    }
}
