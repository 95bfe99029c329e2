//! Interpretation of decoded response text.
//!
//! No structured header/body split is performed: redirects are detected on
//! the status line and the redirect host is pattern-matched out of the
//! `Location` header.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::error::ClientError;

/// Redirect statuses recognised on the status line.
#[allow(clippy::expect_used)]
static MOVED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"30[12] Moved").expect("moved regex is valid"));

/// `Location: <scheme>//<host>/...` terminated by CRLF; captures `<host>`.
#[allow(clippy::expect_used)]
static LOCATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Location: [^\r\n]*?//([^/\r\n]+)/[^\r\n]*\r\n")
        .expect("location regex is valid")
});

/// Status code at the start of an `HTTP/x.y NNN reason` line.
#[allow(clippy::expect_used)]
static STATUS_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^HTTP/\d(?:\.\d)? (\d{3})").expect("status regex is valid"));

/// Returns the first line of the response, without its line terminator.
#[must_use]
pub fn status_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Returns true if the status line reports `301 Moved` or `302 Moved`.
#[must_use]
pub fn is_redirect(text: &str) -> bool {
    MOVED_PATTERN.is_match(status_line(text))
}

/// Extracts the host from the first `Location: <scheme>//<host>/` header.
///
/// # Errors
///
/// Returns [`ClientError::MalformedRedirect`] when no such header exists.
pub fn extract_redirect_host(text: &str) -> Result<String, ClientError> {
    let host = LOCATION_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(ClientError::MalformedRedirect)?;
    trace!(%host, "redirect host extracted");
    Ok(host)
}

/// Decoded response text with helpers for the status line and redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    text: String,
}

impl Response {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    #[must_use]
    pub fn status_line(&self) -> &str {
        status_line(&self.text)
    }

    /// Parses the numeric status code, if the status line is well formed.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        STATUS_CODE_PATTERN
            .captures(self.status_line())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        is_redirect(&self.text)
    }

    /// See [`extract_redirect_host`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedRedirect`] when there is no usable
    /// `Location` header.
    pub fn redirect_host(&self) -> Result<String, ClientError> {
        extract_redirect_host(&self.text)
    }
}
