//! Error types for the HTTP client core.
//!
//! Every variant carries the context a caller needs to report the failure
//! (host, attempt count, offending value). The core never terminates the
//! process; the binary decides what a fatal error means.

use std::io;
use std::str::Utf8Error;

use thiserror::Error;

use crate::retry::RetryExhausted;

/// Errors produced while building, sending or interpreting a request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connect, send or receive failed.
    #[error("network error talking to {host}: {source}")]
    Network {
        /// Host the request was addressed to.
        host: String,
        /// The underlying socket error.
        #[source]
        source: io::Error,
    },

    /// A socket operation exceeded the configured timeout.
    #[error("timeout talking to {host}")]
    Timeout {
        /// Host the request was addressed to.
        host: String,
    },

    /// The response bytes are not valid UTF-8.
    #[error("response from {host} is not valid UTF-8: {source}")]
    Decode {
        /// Host that sent the response.
        host: String,
        /// The decoder error (position of the first invalid byte).
        #[source]
        source: Utf8Error,
    },

    /// A 301/302 response without a usable `Location` header.
    #[error("redirect response has no parseable Location header")]
    MalformedRedirect,

    /// The request to rewrite has no `Host:` header line.
    #[error("request has no Host header to rewrite")]
    MissingHostHeader,

    /// Name resolution failed for the given host.
    #[error("invalid hostname {host}: {source}")]
    InvalidHostname {
        /// The host that failed to resolve.
        host: String,
        /// The resolver error.
        #[source]
        source: io::Error,
    },

    /// The timeout is not a positive, finite number of seconds.
    #[error("invalid timeout {seconds}s: expected a positive number of seconds")]
    InvalidTimeout {
        /// The rejected value.
        seconds: f64,
    },

    /// The method is not one of the supported HTTP/1.1 methods.
    #[error("unsupported method '{method}'")]
    UnsupportedMethod {
        /// The rejected method text.
        method: String,
    },

    /// All retry attempts failed.
    #[error("giving up after {attempts} failed attempts: {last}")]
    GaveUp {
        /// Number of attempts made.
        attempts: u32,
        /// The last observed failure.
        #[source]
        last: Box<ClientError>,
    },
}

impl ClientError {
    /// Creates a socket error, mapping timeouts to [`ClientError::Timeout`].
    pub fn network(host: impl Into<String>, source: io::Error) -> Self {
        let host = host.into();
        match source.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout { host },
            _ => Self::Network { host, source },
        }
    }

    /// Creates a decode error.
    pub fn decode(host: impl Into<String>, source: Utf8Error) -> Self {
        Self::Decode {
            host: host.into(),
            source,
        }
    }

    /// Creates a hostname resolution error.
    pub fn invalid_hostname(host: impl Into<String>, source: io::Error) -> Self {
        Self::InvalidHostname {
            host: host.into(),
            source,
        }
    }

    /// Returns true for failures a retry may fix (socket errors and timeouts).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::InvalidHostname { .. }
        )
    }
}

impl From<RetryExhausted<ClientError>> for ClientError {
    fn from(exhausted: RetryExhausted<ClientError>) -> Self {
        Self::GaveUp {
            attempts: exhausted.attempts,
            last: Box::new(exhausted.last),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display_names_host() {
        let error = ClientError::network(
            "example.com",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        let msg = error.to_string();
        assert!(msg.contains("example.com"), "Expected host in: {msg}");
        assert!(msg.contains("refused"), "Expected cause in: {msg}");
        assert!(error.is_transient());
    }

    #[test]
    fn test_network_timed_out_maps_to_timeout() {
        let error = ClientError::network("example.com", io::ErrorKind::TimedOut.into());
        assert!(matches!(error, ClientError::Timeout { .. }));
        assert!(error.is_transient());
    }

    #[test]
    fn test_network_would_block_maps_to_timeout() {
        let error = ClientError::network("example.com", io::ErrorKind::WouldBlock.into());
        assert!(matches!(error, ClientError::Timeout { .. }));
    }

    #[test]
    fn test_decode_error_is_not_transient() {
        let bytes = [0xcf, 0xf0, 0xee];
        let source = std::str::from_utf8(&bytes).unwrap_err();
        let error = ClientError::decode("example.com", source);
        assert!(!error.is_transient());
        assert!(error.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_malformed_redirect_is_not_transient() {
        assert!(!ClientError::MalformedRedirect.is_transient());
    }

    #[test]
    fn test_gave_up_from_retry_exhausted_keeps_last_failure() {
        let exhausted = RetryExhausted {
            attempts: 5,
            last: ClientError::Timeout {
                host: "example.com".to_string(),
            },
        };
        let error = ClientError::from(exhausted);
        let msg = error.to_string();
        assert!(msg.contains("5 failed attempts"), "got: {msg}");
        assert!(msg.contains("timeout talking to example.com"), "got: {msg}");
        assert!(std::error::Error::source(&error).is_some());
    }
}
