//! The authentication strategy contract.
//!
//! Each concrete scheme (Basic, Bearer, Negotiate, ...) implements
//! [`AuthStrategy`]. New schemes are added by implementing the trait, not by
//! modifying the chain.

use async_trait::async_trait;
use http::HeaderMap;

use super::{AuthError, Identity};
use crate::config::ListenerConfig;

/// Per-request view handed to a strategy's `check`. Strategies authenticate
/// using only what is present in the request: headers and query parameters.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Listener-assigned request id, for log correlation.
    pub id: u64,
    /// Proxy prefix stripped from the path before rule matching.
    pub prefix: &'a str,
    /// Normalized request path, prefix already stripped.
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub query: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        id: u64,
        prefix: &'a str,
        path: &'a str,
        headers: &'a HeaderMap,
        query: Option<&'a str>,
    ) -> Self {
        Self {
            id,
            prefix,
            path,
            headers,
            query,
        }
    }

    /// The `Authorization` header split into `(scheme, credentials)`.
    pub fn authorization(&self) -> Option<(&'a str, &'a str)> {
        self.headers
            .get(http::header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .split_once(' ')
            .map(|(scheme, rest)| (scheme, rest.trim_start()))
    }

    /// First value of a query parameter, undecoded.
    pub fn query_param(&self, name: &str) -> Option<&'a str> {
        self.query?
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// Scheme advertised in a `WWW-Authenticate` challenge header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub scheme: &'static str,
    /// Include a realm built from the request's path prefix.
    pub with_realm: bool,
}

/// Result of one strategy's authentication attempt.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Credentials in this strategy's format were accepted.
    Granted(Identity),
    /// Credentials in this strategy's format were recognized but rejected
    /// (bad password, invalid signature, ...). Definitive: stops the chain.
    Rejected,
    /// No credentials applicable to this strategy were found; the next
    /// strategy in the chain should attempt. A header carrying a different
    /// scheme name is treated the same as no credentials at all.
    TryNext,
}

/// A pluggable authentication scheme.
///
/// `check` must never panic: any internal error (malformed token, expired
/// credential) is logged and mapped to [`CheckOutcome::Rejected`].
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Bind to listener-scoped configuration. Idempotent; called before
    /// `enabled`. A failure prevents this strategy (only) from activating.
    fn init(&mut self, cfg: &ListenerConfig) -> Result<(), AuthError>;

    /// True iff the strategy was successfully configured and should
    /// participate in the chain.
    fn enabled(&self) -> bool;

    /// Chain priority; lower runs earlier.
    fn score(&self) -> i32;

    /// Challenge advertised when authentication outright fails. `None`
    /// suppresses emission for this strategy.
    fn www_auth_header(&self) -> Option<Challenge>;

    /// Attempt authentication for the current request.
    async fn check(&self, ctx: &RequestContext<'_>) -> CheckOutcome;
}
