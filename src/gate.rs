//! The request authorization gate.
//!
//! Entry point invoked once per inbound request by the surrounding router.
//! Composes the path matcher (does this path require auth, and with which
//! permission set?), the strategy chain (produce an identity) and the
//! permission evaluator (is the identity allowed?).

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use http::{HeaderMap, StatusCode};
use tokio::sync::RwLock;

use crate::{
    auth::{
        AuthError, AuthStrategy, BasicStrategy, BearerStrategy, ChainVerdict, ContextValidator,
        Identity, NegotiateStrategy, RequestContext, StrategyChain,
    },
    authz::PermissionMap,
    config::ListenerConfig,
    routing::{PatternMatch, RuleSet},
};

/// Per-request decision returned by [`AuthGate::check`].
#[derive(Debug)]
pub enum GateDecision {
    /// No authentication attempted or needed: the path matches no auth rule,
    /// is explicitly excluded, or no strategies are registered.
    Open,
    /// Authenticated and authorized; the identity travels with the request.
    Granted(Identity),
    /// No applicable credentials; respond 401 with challenge headers.
    Unauthorized,
    /// Credentials rejected or identity not permitted; respond 403.
    Forbidden,
}

impl GateDecision {
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            GateDecision::Open | GateDecision::Granted(_) => None,
            GateDecision::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            GateDecision::Forbidden => Some(StatusCode::FORBIDDEN),
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            GateDecision::Open | GateDecision::Granted(_) => None,
            GateDecision::Unauthorized => Some("Unauthorized"),
            GateDecision::Forbidden => Some("Forbidden"),
        }
    }
}

/// Request authorization gate for one listener.
///
/// Owned by the listener instance and injected where needed; multiple
/// independent listeners in one process each carry their own gate. Rule sets
/// are built from configuration at startup and stay read-mostly; runtime
/// mutation (disabling an endpoint, adding a rule or strategy) takes the
/// corresponding write lock.
pub struct AuthGate {
    cfg: Arc<ListenerConfig>,
    chain: StrategyChain,
    endpoints: RwLock<RuleSet<PermissionMap>>,
    disabled: RwLock<RuleSet<bool>>,
    request_seq: AtomicU64,
}

impl AuthGate {
    /// Build a gate with an empty chain; strategies are added explicitly.
    pub fn new(cfg: Arc<ListenerConfig>) -> Self {
        let endpoints = cfg.auth.endpoints.clone().into();
        let disabled = cfg.disabled_endpoints.clone().into();

        Self {
            chain: StrategyChain::new(cfg.clone()),
            cfg,
            endpoints: RwLock::new(endpoints),
            disabled: RwLock::new(disabled),
            request_seq: AtomicU64::new(0),
        }
    }

    /// Build a gate with the standard strategy set: Basic and Bearer, plus
    /// Negotiate when a context validator is supplied. Strategies disabled
    /// in configuration are silently skipped.
    pub async fn with_standard_strategies(
        cfg: Arc<ListenerConfig>,
        negotiate_validator: Option<Arc<dyn ContextValidator>>,
    ) -> Result<Self, AuthError> {
        let gate = Self::new(cfg);
        gate.add_strategy(Box::new(BasicStrategy::new())).await?;
        gate.add_strategy(Box::new(BearerStrategy::new())).await?;
        if let Some(validator) = negotiate_validator {
            gate.add_strategy(Box::new(NegotiateStrategy::new(validator)))
                .await?;
        }
        Ok(gate)
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.cfg
    }

    /// Initialize and register a strategy; see [`StrategyChain::add`].
    pub async fn add_strategy(&self, strategy: Box<dyn AuthStrategy>) -> Result<(), AuthError> {
        self.chain.add(strategy).await
    }

    /// Whether any strategy is active. The router may skip the gate entirely
    /// when this is false.
    pub async fn enabled(&self) -> bool {
        self.chain.is_enabled().await
    }

    /// Monotonic per-gate request id for log correlation.
    pub fn next_request_id(&self) -> u64 {
        self.request_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Whether a disabled-endpoint rule covers `path`.
    pub async fn is_endpoint_disabled(&self, path: &str) -> bool {
        matches!(
            self.disabled.read().await.lookup(path),
            PatternMatch::Matched { value: &true, .. }
        )
    }

    /// Disable an endpoint pattern at runtime.
    pub async fn disable_endpoint(&self, pattern: impl Into<String>) {
        self.disabled.write().await.insert(pattern, true);
    }

    /// Add an auth-required endpoint pattern at runtime.
    pub async fn add_auth_endpoint(&self, pattern: impl Into<String>, permissions: PermissionMap) {
        self.endpoints.write().await.insert(pattern, permissions);
    }

    /// Decide whether the request may proceed.
    ///
    /// `path` is the normalized request path with `prefix` already stripped;
    /// `query` is the raw query string if any.
    pub async fn check(
        &self,
        id: u64,
        prefix: &str,
        path: &str,
        headers: &HeaderMap,
        query: Option<&str>,
    ) -> GateDecision {
        let endpoints = self.endpoints.read().await;
        let permissions = match endpoints.lookup(path) {
            PatternMatch::Matched { value, .. } => value,
            // Unmatched or explicitly excluded paths require no
            // authentication.
            PatternMatch::Excluded { .. } | PatternMatch::NoMatch => return GateDecision::Open,
        };

        let ctx = RequestContext::new(id, prefix, path, headers, query);
        match self.chain.check(&ctx, permissions).await {
            ChainVerdict::Open => GateDecision::Open,
            ChainVerdict::Granted(identity) => GateDecision::Granted(identity),
            ChainVerdict::Unauthorized => GateDecision::Unauthorized,
            ChainVerdict::Forbidden => GateDecision::Forbidden,
        }
    }

    /// Append aggregated `WWW-Authenticate` headers. Called by the router
    /// only for a non-zero status, before any response body is written.
    pub async fn write_auth_request_headers(
        &self,
        headers: &mut HeaderMap,
        prefix: &str,
        path: &str,
    ) {
        self.chain
            .write_challenge_headers(headers, prefix, path)
            .await;
    }
}
