//! Hostname validation through name resolution.

use std::net::{SocketAddr, ToSocketAddrs};

use tracing::{debug, instrument};

use crate::error::ClientError;
use crate::retry::RetryPolicy;
use crate::transport::HTTP_PORT;

/// Host used when none is supplied.
pub const DEFAULT_HOST: &str = "ya.ru";

/// Resolves `host` on the HTTP port.
///
/// # Errors
///
/// Returns [`ClientError::InvalidHostname`] if resolution fails or yields
/// no addresses.
pub fn resolve_host(host: &str) -> Result<Vec<SocketAddr>, ClientError> {
    let addrs: Vec<SocketAddr> = (host, HTTP_PORT)
        .to_socket_addrs()
        .map_err(|e| ClientError::invalid_hostname(host, e))?
        .collect();
    if addrs.is_empty() {
        return Err(ClientError::invalid_hostname(
            host,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        ));
    }
    debug!(%host, count = addrs.len(), "host resolved");
    Ok(addrs)
}

/// Obtains a host from `next_candidate` and checks that it resolves,
/// retrying under `policy`.
///
/// `next_candidate` is called once per attempt, so an interactive caller can
/// ask again after a failure. A blank candidate selects [`DEFAULT_HOST`].
///
/// # Errors
///
/// Returns [`ClientError::GaveUp`] wrapping the last resolution failure once
/// every attempt failed.
#[instrument(skip(policy, next_candidate), fields(max_tries = policy.max_tries()))]
pub fn acquire_host<F>(policy: &RetryPolicy, mut next_candidate: F) -> Result<String, ClientError>
where
    F: FnMut() -> String,
{
    let host = policy.run(|| {
        let candidate = next_candidate();
        let host = if candidate.trim().is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            candidate.trim().to_string()
        };
        resolve_host(&host).map(|_| host)
    })?;
    Ok(host)
}
