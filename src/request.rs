//! HTTP/1.1 request construction.
//!
//! A request is assembled line by line into a single text buffer:
//!
//! ```text
//! METHOD target HTTP/1.1\r\n
//! Host: host\r\n
//! Name: value\r\n        (zero or more, in the order supplied)
//! Cookie: a; b\r\n       (when cookie entries are supplied)
//! \r\n
//! ```
//!
//! Header names and values are passed through without validation.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::error::ClientError;

const CRLF: &str = "\r\n";

/// Separator placed between collected cookie tokens.
const COOKIE_SEPARATOR: &str = "; ";

/// HTTP methods accepted on the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    Options,
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Trace,
    Connect,
}

impl Method {
    /// Every supported method, in the order they are offered to users.
    pub const ALL: [Method; 8] = [
        Method::Options,
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Trace,
        Method::Connect,
    ];

    /// Returns the upper-case token written on the request line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ClientError;

    /// Parses a method case-insensitively. Blank input selects `GET`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::Get);
        }
        let upper = trimmed.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == upper)
            .ok_or_else(|| ClientError::UnsupportedMethod {
                method: trimmed.to_string(),
            })
    }
}

/// One header entry following the mandatory `Host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderEntry {
    /// A `Name: value` line appended verbatim.
    Literal(String),

    /// Tokens joined with `"; "` into a single `Cookie` header.
    Cookie(Vec<String>),
}

impl HeaderEntry {
    /// Creates a literal header entry.
    pub fn literal(line: impl Into<String>) -> Self {
        Self::Literal(line.into())
    }

    /// Creates a cookie entry from raw `key=value` inputs.
    ///
    /// See [`collect_cookie_tokens`] for how inputs become tokens.
    pub fn cookie_from_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Cookie(collect_cookie_tokens(inputs))
    }
}

/// Collects cookie tokens from user inputs, stopping at the first empty one.
///
/// Each input is added to the token list one character at a time, so a
/// single `a=1` input yields the tokens `a`, `=`, `1` and the header
/// `Cookie: a; =; 1`. This matches the behaviour of the interactive tool the
/// header format comes from and is kept as-is.
pub fn collect_cookie_tokens<I, S>(inputs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_empty() {
            break;
        }
        tokens.extend(input.chars().map(String::from));
    }
    tokens
}

/// A finished request, ready to be handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    text: String,
}

impl Request {
    /// Wraps already-formatted request text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Mutable buffer used while a request is being assembled.
///
/// # Example
///
/// ```
/// use rawhttp_core::{Method, RequestBuilder};
///
/// let request = RequestBuilder::new(Method::Get, "/", "example.com")
///     .header("Connection: close")
///     .build();
/// assert_eq!(
///     request.as_str(),
///     "GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    buffer: String,
}

impl RequestBuilder {
    /// Starts a request with its request line and `Host` header.
    pub fn new(method: Method, target: &str, host: &str) -> Self {
        let mut buffer = String::new();
        buffer.push_str(&format!("{method} {target} HTTP/1.1{CRLF}"));
        buffer.push_str(&format!("Host: {host}{CRLF}"));
        Self { buffer }
    }

    /// Appends a literal `Name: value` header line.
    #[must_use]
    pub fn header(mut self, line: &str) -> Self {
        self.buffer.push_str(line);
        self.buffer.push_str(CRLF);
        self
    }

    /// Appends a `Cookie` header joining `tokens` with `"; "`.
    #[must_use]
    pub fn cookie<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
        let joined = tokens
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(COOKIE_SEPARATOR);
        self.buffer.push_str("Cookie: ");
        self.buffer.push_str(&joined);
        self.buffer.push_str(CRLF);
        self
    }

    /// Appends one header entry.
    #[must_use]
    pub fn entry(self, entry: &HeaderEntry) -> Self {
        match entry {
            HeaderEntry::Literal(line) => self.header(line),
            HeaderEntry::Cookie(tokens) => self.cookie(tokens),
        }
    }

    /// Terminates the header block and freezes the request.
    #[must_use]
    pub fn build(mut self) -> Request {
        self.buffer.push_str(CRLF);
        Request { text: self.buffer }
    }
}

/// Builds a complete request from its parts.
#[instrument(skip(headers), fields(header_count = headers.len()))]
#[must_use]
pub fn build_request(method: Method, target: &str, host: &str, headers: &[HeaderEntry]) -> Request {
    let request = headers
        .iter()
        .fold(RequestBuilder::new(method, target, host), RequestBuilder::entry)
        .build();
    debug!(bytes = request.as_str().len(), "request built");
    request
}
