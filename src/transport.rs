//! Single request/response exchange over plain TCP.
//!
//! [`TcpTransport`] connects to `host:80`, writes the request bytes, performs
//! exactly one receive of at most [`RECEIVE_BUFFER_SIZE`] bytes and closes
//! the socket. Connect/send/receive failures are retried with the
//! transport's [`RetryPolicy`]; the UTF-8 decode happens after the retried
//! section, so a decode failure is reported immediately.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, instrument, trace};

use crate::error::ClientError;
use crate::request::Request;
use crate::retry::RetryPolicy;

/// Port used for every connection (plain HTTP, no TLS).
pub const HTTP_PORT: u16 = 80;

/// Upper bound for the single receive call.
pub const RECEIVE_BUFFER_SIZE: usize = 65536;

/// Timeout applied to connect, send and receive when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A network round-trip: send one request, get back the decoded response.
pub trait Transport {
    /// Sends `request` to `host` and returns the response text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::GaveUp`] when every network attempt failed and
    /// [`ClientError::Decode`] when the response is not valid UTF-8.
    fn send(&self, host: &str, timeout: Duration, request: &Request) -> Result<String, ClientError>;
}

/// Blocking TCP transport.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    port: u16,
    retry: RetryPolicy,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpTransport {
    /// Creates a transport on port 80 with Fibonacci backoff and 5 attempts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: HTTP_PORT,
            retry: RetryPolicy::default(),
        }
    }

    /// Creates a transport targeting a different port (used against local
    /// test servers).
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::new()
        }
    }

    /// Replaces the retry policy wrapping each exchange.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// One attempt: connect, send, receive once. The socket is closed when
    /// `stream` goes out of scope, on success and on every error path.
    fn exchange(&self, host: &str, timeout: Duration, request: &Request) -> Result<Vec<u8>, ClientError> {
        let mut stream = self.connect(host, timeout)?;
        stream
            .set_read_timeout(Some(timeout))
            .and_then(|()| stream.set_write_timeout(Some(timeout)))
            .map_err(|e| ClientError::network(host, e))?;

        stream
            .write_all(request.as_bytes())
            .map_err(|e| ClientError::network(host, e))?;
        trace!(bytes = request.as_bytes().len(), "request sent");

        let mut buffer = vec![0_u8; RECEIVE_BUFFER_SIZE];
        let received = stream
            .read(&mut buffer)
            .map_err(|e| ClientError::network(host, e))?;
        buffer.truncate(received);
        debug!(received, "response received");
        Ok(buffer)
    }

    fn connect(&self, host: &str, timeout: Duration) -> Result<TcpStream, ClientError> {
        let addrs: Vec<SocketAddr> = (host, self.port)
            .to_socket_addrs()
            .map_err(|e| ClientError::network(host, e))?
            .collect();

        let mut last_error = io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved");
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    debug!(%addr, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect failed");
                    last_error = e;
                }
            }
        }
        Err(ClientError::network(host, last_error))
    }
}

impl Transport for TcpTransport {
    #[instrument(skip(self, request), fields(port = self.port, timeout_ms = timeout.as_millis()))]
    fn send(&self, host: &str, timeout: Duration, request: &Request) -> Result<String, ClientError> {
        let bytes = self
            .retry
            .run_while(|| self.exchange(host, timeout, request), ClientError::is_transient)
            .map_err(|exhausted| {
                if exhausted.last.is_transient() {
                    ClientError::from(exhausted)
                } else {
                    exhausted.last
                }
            })?;
        decode_response(host, &bytes)
    }
}

/// Decodes response bytes as strict UTF-8.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] for any invalid byte sequence; no lossy
/// replacement is attempted.
pub fn decode_response(host: &str, bytes: &[u8]) -> Result<String, ClientError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| ClientError::decode(host, e))
}

/// Converts a timeout in (fractional) seconds to a [`Duration`].
///
/// # Errors
///
/// Returns [`ClientError::InvalidTimeout`] for zero, negative, NaN or
/// infinite values.
pub fn timeout_from_secs(seconds: f64) -> Result<Duration, ClientError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ClientError::InvalidTimeout { seconds });
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| ClientError::InvalidTimeout { seconds })
}
