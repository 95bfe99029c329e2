//! Request orchestration: build, send, interpret, optionally redirect once.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::error::ClientError;
use crate::redirect::follow_redirect;
use crate::request::{HeaderEntry, Method, Request, build_request};
use crate::resolve::DEFAULT_HOST;
use crate::response::Response;
use crate::retry::{DEFAULT_MAX_TRIES, RetryPolicy};
use crate::transport::{DEFAULT_TIMEOUT, TcpTransport, Transport};

/// Default request target.
pub const DEFAULT_TARGET: &str = "/";

/// Everything needed to perform one exchange.
///
/// Replaces process-wide defaults: every value the core uses comes from here.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Request method.
    pub method: Method,
    /// Request target (path and query).
    pub target: String,
    /// Host to connect to and to name in the `Host` header.
    pub host: String,
    /// Applied to connect, send and receive.
    pub timeout: Duration,
    /// Headers following `Host`, in order.
    pub headers: Vec<HeaderEntry>,
    /// Where the binary persists the final response, if anywhere.
    pub output_file: Option<PathBuf>,
    /// Follow a 301/302 response once.
    pub follow_redirects: bool,
    /// Attempt ceiling for each network exchange.
    pub max_tries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            method: Method::default(),
            target: DEFAULT_TARGET.to_string(),
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
            output_file: None,
            follow_redirects: true,
            max_tries: DEFAULT_MAX_TRIES,
        }
    }
}

/// Result of [`HttpClient::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The request as first sent.
    pub request: Request,
    /// The final response (after the redirect, if one was followed).
    pub response: Response,
    /// Host the request was redirected to, if a redirect was followed.
    pub redirected_to: Option<String>,
}

/// Drives a [`Transport`] through one request and at most one redirect.
#[derive(Debug, Clone)]
pub struct HttpClient<T = TcpTransport> {
    transport: T,
}

impl Default for HttpClient<TcpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient<TcpTransport> {
    /// Creates a client over the default TCP transport (port 80).
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: TcpTransport::new(),
        }
    }

    /// Creates a TCP client whose retry ceiling follows `config.max_tries`.
    #[must_use]
    pub fn for_config(config: &ClientConfig) -> Self {
        let retry = RetryPolicy::default().with_max_tries(config.max_tries);
        Self {
            transport: TcpTransport::new().with_retry_policy(retry),
        }
    }
}

impl<T: Transport> HttpClient<T> {
    /// Creates a client over any transport.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the request from `config`, sends it and follows one redirect.
    ///
    /// # Errors
    ///
    /// Returns any [`ClientError`] from the transport or the redirect step.
    #[instrument(skip(self, config), fields(method = %config.method, host = %config.host, target = %config.target))]
    pub fn execute(&self, config: &ClientConfig) -> Result<Exchange, ClientError> {
        let request = build_request(config.method, &config.target, &config.host, &config.headers);
        let response = Response::new(self.transport.send(&config.host, config.timeout, &request)?);
        debug!(status = ?response.status_code(), "response interpreted");

        if !(config.follow_redirects && response.is_redirect()) {
            return Ok(Exchange {
                request,
                response,
                redirected_to: None,
            });
        }

        let redirected = follow_redirect(&self.transport, response.text(), config.timeout, &request)?;
        info!(host = %redirected.host, "redirect followed");
        Ok(Exchange {
            request,
            response: Response::new(redirected.response),
            redirected_to: Some(redirected.host),
        })
    }
}
