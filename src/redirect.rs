//! Single-hop redirect handling.
//!
//! A 301/302 response is followed exactly once: the `Host:` value of the
//! original request is rewritten to the redirect host and the request is
//! sent again. Whatever comes back, including another redirect, is returned
//! to the caller as-is.

use std::ops::Range;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, instrument};

use crate::error::ClientError;
use crate::request::Request;
use crate::response::extract_redirect_host;
use crate::transport::Transport;

/// `Host: value` at the start of a header line; captures the value.
#[allow(clippy::expect_used)]
static HOST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Host: ([^\r\n]+)\r\n").expect("host regex is valid"));

/// Byte range of the first `Host:` header value.
///
/// The search starts after the request line, so a target containing
/// `Host: ` is never mistaken for the header.
fn host_value_span(text: &str) -> Option<Range<usize>> {
    let headers_start = text.find("\r\n")? + 2;
    HOST_PATTERN
        .captures(&text[headers_start..])
        .and_then(|caps| caps.get(1))
        .map(|m| headers_start + m.start()..headers_start + m.end())
}

/// Returns the value of the first `Host:` header in `request`, if any.
#[must_use]
pub fn request_host(request: &Request) -> Option<&str> {
    let text = request.as_str();
    host_value_span(text).map(|span| &text[span])
}

/// Replaces the value of the first `Host:` header with `new_host`.
///
/// Only the header value is touched; the same text elsewhere in the request
/// (request target, other headers) is left alone.
///
/// # Errors
///
/// Returns [`ClientError::MissingHostHeader`] if the request has no
/// `Host:` line.
pub fn rewrite_host(request: &Request, new_host: &str) -> Result<Request, ClientError> {
    let text = request.as_str();
    let span = host_value_span(text).ok_or(ClientError::MissingHostHeader)?;

    let mut rewritten = String::with_capacity(text.len() + new_host.len());
    rewritten.push_str(&text[..span.start]);
    rewritten.push_str(new_host);
    rewritten.push_str(&text[span.end..]);
    Ok(Request::from_text(rewritten))
}

/// Outcome of following a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirected {
    /// Host the request was re-issued to.
    pub host: String,
    /// The rewritten request that was sent.
    pub request: Request,
    /// Response text from the redirect target.
    pub response: String,
}

/// Follows the redirect in `response` once, re-sending `original` to the
/// host named by its `Location` header.
///
/// # Errors
///
/// Returns [`ClientError::MalformedRedirect`] when the response carries no
/// usable `Location` header, [`ClientError::MissingHostHeader`] when the
/// original request cannot be rewritten, and any transport error from the
/// second exchange.
#[instrument(skip(transport, response, original), fields(timeout_ms = timeout.as_millis()))]
pub fn follow_redirect<T>(
    transport: &T,
    response: &str,
    timeout: Duration,
    original: &Request,
) -> Result<Redirected, ClientError>
where
    T: Transport + ?Sized,
{
    let host = extract_redirect_host(response)?;
    let request = rewrite_host(original, &host)?;
    info!(%host, "Redirect");
    let response = transport.send(&host, timeout, &request)?;
    Ok(Redirected {
        host,
        request,
        response,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::request::{Method, build_request};

    /// Transport double returning canned responses and recording calls.
    struct ScriptedTransport {
        responses: RefCell<Vec<String>>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: RefCell::new(responses.iter().rev().map(|s| (*s).to_string()).collect()),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, host: &str, _timeout: Duration, request: &Request) -> Result<String, ClientError> {
            self.calls
                .borrow_mut()
                .push((host.to_string(), request.as_str().to_string()));
            Ok(self.responses.borrow_mut().pop().unwrap_or_default())
        }
    }

    // ==================== Rewrite Tests ====================

    #[test]
    fn test_rewrite_host_replaces_header_value() {
        let request = Request::from_text("GET / HTTP/1.1\r\nHost: google.com\r\n\r\n");
        let rewritten = rewrite_host(&request, "www.google.com").unwrap();
        assert_eq!(
            rewritten.as_str(),
            "GET / HTTP/1.1\r\nHost: www.google.com\r\n\r\n"
        );
    }

    #[test]
    fn test_rewrite_host_leaves_other_occurrences_alone() {
        let request = Request::from_text(
            "GET /a.com HTTP/1.1\r\nHost: a.com\r\nReferer: http://a.com/\r\n\r\n",
        );
        let rewritten = rewrite_host(&request, "b.com").unwrap();
        assert_eq!(
            rewritten.as_str(),
            "GET /a.com HTTP/1.1\r\nHost: b.com\r\nReferer: http://a.com/\r\n\r\n"
        );
    }

    #[test]
    fn test_rewrite_host_ignores_host_text_in_target() {
        let request = build_request(Method::Get, "/Host: x", "a.com", &[]);
        let rewritten = rewrite_host(&request, "b.com").unwrap();
        assert_eq!(
            rewritten.as_str(),
            "GET /Host: x HTTP/1.1\r\nHost: b.com\r\n\r\n"
        );
        assert_eq!(request_host(&request), Some("a.com"));
        assert_eq!(request_host(&rewritten), Some("b.com"));
    }

    #[test]
    fn test_rewrite_host_ignores_header_name_suffix() {
        let request = Request::from_text("GET / HTTP/1.1\r\nX-Forwarded-Host: a.com\r\nHost: a.com\r\n\r\n");
        let rewritten = rewrite_host(&request, "b.com").unwrap();
        assert_eq!(
            rewritten.as_str(),
            "GET / HTTP/1.1\r\nX-Forwarded-Host: a.com\r\nHost: b.com\r\n\r\n"
        );
    }

    #[test]
    fn test_rewrite_host_without_host_header_is_error() {
        let request = Request::from_text("GET / HTTP/1.1\r\n\r\n");
        let err = rewrite_host(&request, "b.com").unwrap_err();
        assert!(matches!(err, ClientError::MissingHostHeader));
    }

    #[test]
    fn test_request_host_reads_first_header() {
        let request = Request::from_text("GET / HTTP/1.1\r\nHost: a.com\r\nHost: c.com\r\n\r\n");
        assert_eq!(request_host(&request), Some("a.com"));
        assert_eq!(request_host(&Request::from_text("GET /\r\n\r\n")), None);
    }

    // ==================== Follow Tests ====================

    #[test]
    fn test_follow_redirect_resends_to_location_host() {
        let transport = ScriptedTransport::new(&["HTTP/1.1 200 OK\r\n\r\nhello"]);
        let original =
            Request::from_text("GET / HTTP/1.1\r\nHost: ya.ru\r\nConnection: close\r\n\r\n");
        let moved = "HTTP/1.1 301 Moved Permanently\r\nLocation: https://www.ya.ru/\r\n\r\n";

        let redirected = follow_redirect(&transport, moved, Duration::from_secs(1), &original).unwrap();

        assert_eq!(redirected.host, "www.ya.ru");
        assert_eq!(redirected.response, "HTTP/1.1 200 OK\r\n\r\nhello");
        let calls = transport.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "www.ya.ru");
        assert_eq!(
            calls[0].1,
            "GET / HTTP/1.1\r\nHost: www.ya.ru\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_follow_redirect_is_single_hop() {
        let second_redirect = "HTTP/1.1 302 Moved Temporarily\r\nLocation: http://c.com/\r\n\r\n";
        let transport = ScriptedTransport::new(&[second_redirect, "HTTP/1.1 200 OK\r\n\r\n"]);
        let original = Request::from_text("GET / HTTP/1.1\r\nHost: a.com\r\n\r\n");
        let moved = "HTTP/1.1 301 Moved Permanently\r\nLocation: http://b.com/\r\n\r\n";

        let redirected = follow_redirect(&transport, moved, Duration::from_secs(1), &original).unwrap();

        assert_eq!(redirected.response, second_redirect);
        assert_eq!(transport.calls.borrow().len(), 1);
    }

    #[test]
    fn test_follow_redirect_without_location_sends_nothing() {
        let transport = ScriptedTransport::new(&[]);
        let original = Request::from_text("GET / HTTP/1.1\r\nHost: a.com\r\n\r\n");
        let err = follow_redirect(
            &transport,
            "HTTP/1.1 301 Moved Permanently\r\n\r\n",
            Duration::from_secs(1),
            &original,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::MalformedRedirect));
        assert!(transport.calls.borrow().is_empty());
    }
}
