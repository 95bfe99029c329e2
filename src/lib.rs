//! Raw-socket HTTP/1.1 client core.
//!
//! This library builds HTTP/1.1 requests line by line, sends them over a
//! plain TCP connection, interprets the raw response text and follows a
//! single 301/302 redirect. Network operations run under a generic retry
//! executor with pluggable backoff.
//!
//! # Architecture
//!
//! The library is organized into the following modules (leaf first):
//! - [`backoff`] - Constant and Fibonacci delay sequences
//! - [`retry`] - Retry executor with give-up handling
//! - [`request`] - Request construction
//! - [`transport`] - One TCP round-trip per call
//! - [`response`] - Status line and `Location` interpretation
//! - [`redirect`] - `Host` rewrite and single-hop re-issue
//! - [`resolve`] - Hostname validation
//! - [`client`] - Orchestration of the whole exchange

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backoff;
pub mod client;
pub mod error;
pub mod redirect;
pub mod request;
pub mod resolve;
pub mod response;
pub mod retry;
pub mod transport;

// Re-export commonly used types
pub use backoff::{Backoff, BackoffSequence};
pub use client::{ClientConfig, DEFAULT_TARGET, Exchange, HttpClient};
pub use error::ClientError;
pub use redirect::{Redirected, follow_redirect, rewrite_host};
pub use request::{HeaderEntry, Method, Request, RequestBuilder, build_request, collect_cookie_tokens};
pub use resolve::{DEFAULT_HOST, acquire_host, resolve_host};
pub use response::{Response, extract_redirect_host, is_redirect};
pub use retry::{
    DEFAULT_MAX_TRIES, RetryExhausted, RetryObserver, RetryPolicy, TracingObserver,
    execute_with_retry, execute_with_retry_if,
};
pub use transport::{
    DEFAULT_TIMEOUT, HTTP_PORT, RECEIVE_BUFFER_SIZE, TcpTransport, Transport, decode_response,
    timeout_from_secs,
};
