//! Negotiated-protocol authentication (SPNEGO-style `Negotiate` scheme).
//!
//! The strategy owns the HTTP side only: header parsing, base64 decoding and
//! outcome mapping. Validation of the security context token (Kerberos,
//! NTLM, ...) is a collaborator injected as a [`ContextValidator`], keeping
//! the protocol mechanics outside the core.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use super::{AuthError, AuthStrategy, Challenge, CheckOutcome, Identity, RequestContext};
use crate::config::{ListenerConfig, NegotiateAuthConfig};

pub(crate) const METHOD: &str = "negotiate";
const SCHEME: &str = "Negotiate";

/// Result of a successfully accepted security context. Attached to the
/// identity as its `extra` payload; ownership passes to the caller for the
/// lifetime of the request.
#[derive(Debug, Clone)]
pub struct NegotiatedContext {
    pub user: String,
    pub groups: Vec<String>,
}

/// Accepts and validates a decoded security context token.
///
/// Implementations may block on a protocol handshake; that blocking is
/// confined to the calling request.
#[async_trait]
pub trait ContextValidator: Send + Sync {
    async fn accept(&self, token: &[u8]) -> Result<NegotiatedContext, AuthError>;
}

/// Negotiated-protocol authentication strategy.
pub struct NegotiateStrategy {
    cfg: Option<NegotiateAuthConfig>,
    validator: Arc<dyn ContextValidator>,
}

impl NegotiateStrategy {
    pub fn new(validator: Arc<dyn ContextValidator>) -> Self {
        Self {
            cfg: None,
            validator,
        }
    }
}

#[async_trait]
impl AuthStrategy for NegotiateStrategy {
    fn init(&mut self, cfg: &ListenerConfig) -> Result<(), AuthError> {
        self.cfg = cfg.auth.negotiate.as_ref().filter(|c| c.enabled).cloned();
        Ok(())
    }

    fn enabled(&self) -> bool {
        self.cfg.is_some()
    }

    fn score(&self) -> i32 {
        self.cfg.as_ref().map(|c| c.score).unwrap_or_default()
    }

    fn www_auth_header(&self) -> Option<Challenge> {
        Some(Challenge {
            scheme: SCHEME,
            with_realm: false,
        })
    }

    async fn check(&self, ctx: &RequestContext<'_>) -> CheckOutcome {
        if self.cfg.is_none() {
            return CheckOutcome::TryNext;
        }

        let Some((scheme, token)) = ctx.authorization() else {
            return CheckOutcome::TryNext;
        };
        if scheme != SCHEME {
            return CheckOutcome::TryNext;
        }

        let raw = match BASE64.decode(token) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::info!(
                    request_id = ctx.id,
                    %error,
                    "negotiate login error: bad base64 in negotiation header"
                );
                return CheckOutcome::Rejected;
            }
        };

        match self.validator.accept(&raw).await {
            Ok(context) => {
                let identity = Identity::new(METHOD, context.user.clone())
                    .with_groups(context.groups.clone())
                    .with_extra(Arc::new(context));
                CheckOutcome::Granted(identity)
            }
            Err(error) => {
                tracing::info!(request_id = ctx.id, %error, "negotiate login error");
                CheckOutcome::Rejected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

    use super::*;

    /// Validator accepting exactly one token value.
    struct FixedValidator {
        expected: Vec<u8>,
    }

    #[async_trait]
    impl ContextValidator for FixedValidator {
        async fn accept(&self, token: &[u8]) -> Result<NegotiatedContext, AuthError> {
            if token == self.expected.as_slice() {
                Ok(NegotiatedContext {
                    user: "alice@EXAMPLE.COM".into(),
                    groups: vec!["ops".into()],
                })
            } else {
                Err(AuthError::Misconfigured {
                    strategy: METHOD,
                    reason: "context validation failed".into(),
                })
            }
        }
    }

    fn strategy() -> NegotiateStrategy {
        let cfg = ListenerConfig::from_toml_str(
            r#"
            [auth.negotiate]
            enabled = true
            "#,
        )
        .unwrap();

        let mut s = NegotiateStrategy::new(Arc::new(FixedValidator {
            expected: b"spnego-token".to_vec(),
        }));
        s.init(&cfg).unwrap();
        s
    }

    fn negotiate_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Negotiate {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn accepted_context_reaches_identity_extra() {
        let s = strategy();
        let headers = negotiate_headers(&BASE64.encode(b"spnego-token"));
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        match s.check(&ctx).await {
            CheckOutcome::Granted(identity) => {
                assert_eq!(identity.user, "alice@EXAMPLE.COM");
                assert_eq!(identity.groups, vec!["ops".to_string()]);
                let context = identity.extra_as::<NegotiatedContext>().unwrap();
                assert_eq!(context.user, "alice@EXAMPLE.COM");
            }
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_context_is_definitive() {
        let s = strategy();
        let headers = negotiate_headers(&BASE64.encode(b"forged-token"));
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::Rejected));
    }

    #[tokio::test]
    async fn malformed_base64_is_definitive() {
        let s = strategy();
        let headers = negotiate_headers("%%%%");
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::Rejected));
    }

    #[tokio::test]
    async fn no_header_falls_through() {
        let s = strategy();
        let headers = HeaderMap::new();
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::TryNext));
    }

    #[test]
    fn disabled_without_config_section() {
        let cfg = ListenerConfig::default();
        let mut s = NegotiateStrategy::new(Arc::new(FixedValidator { expected: vec![] }));
        s.init(&cfg).unwrap();
        assert!(!s.enabled());
    }
}
