//! Password-based authentication (HTTP Basic).
//!
//! Credentials are verified against the listener's user store, which holds
//! hex-encoded SHA-512 digests of `password + username` (see
//! [`super::credential_hash`]). Comparison is constant-time.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use super::{
    AuthError, AuthStrategy, Challenge, CheckOutcome, Identity, RequestContext, verify_credential,
};
use crate::config::{BasicAuthConfig, ListenerConfig, UserConfig};

pub(crate) const METHOD: &str = "basic";
const SCHEME: &str = "Basic";

/// HTTP Basic authentication strategy.
#[derive(Default)]
pub struct BasicStrategy {
    cfg: Option<BasicAuthConfig>,
    users: HashMap<String, UserConfig>,
}

impl BasicStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStrategy for BasicStrategy {
    fn init(&mut self, cfg: &ListenerConfig) -> Result<(), AuthError> {
        self.cfg = None;
        self.users.clear();

        let Some(basic) = cfg.auth.basic.as_ref().filter(|c| c.enabled) else {
            return Ok(());
        };

        self.cfg = Some(basic.clone());
        self.users = cfg.auth.users.clone();
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
            with_realm: true,
        })
    }

    async fn check(&self, ctx: &RequestContext<'_>) -> CheckOutcome {
        if self.cfg.is_none() {
            return CheckOutcome::TryNext;
        }

        let Some((scheme, credentials)) = ctx.authorization() else {
            return CheckOutcome::TryNext;
        };
        if scheme != SCHEME {
            return CheckOutcome::TryNext;
        }

        // From here on the credential is in our format: any failure is
        // definitive.
        let Some((user, password)) = BASE64
            .decode(credentials)
            .ok()
            .and_then(|raw| String::from_utf8(raw).ok())
            .and_then(|pair| {
                pair.split_once(':')
                    .map(|(u, p)| (u.to_string(), p.to_string()))
            })
        else {
            tracing::info!(request_id = ctx.id, "basic login error: malformed credentials");
            return CheckOutcome::Rejected;
        };

        let verified = self
            .users
            .get(&user)
            .is_some_and(|def| verify_credential(&password, &user, &def.password));

        if !verified {
            tracing::info!(
                request_id = ctx.id,
                user = %user,
                "basic login error: illegal login or password"
            );
            return CheckOutcome::Rejected;
        }

        let groups = self
            .users
            .get(&user)
            .map(|def| def.groups.clone())
            .unwrap_or_default();

        CheckOutcome::Granted(Identity::new(METHOD, user).with_groups(groups))
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

    use super::*;
    use crate::auth::credential_hash;

    fn listener_config() -> ListenerConfig {
        ListenerConfig::from_toml_str(&format!(
            r#"
            [auth.users.alice]
            password = "{}"
            groups = ["ops"]

            [auth.basic]
            enabled = true
            "#,
            credential_hash("s3cr3t", "alice")
        ))
        .unwrap()
    }

    fn strategy() -> BasicStrategy {
        let mut s = BasicStrategy::new();
        s.init(&listener_config()).unwrap();
        s
    }

    fn header_for(user: &str, password: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("Basic {}", BASE64.encode(format!("{user}:{password}")));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        headers
    }

    #[tokio::test]
    async fn valid_credentials_grant_identity_with_groups() {
        let s = strategy();
        let headers = header_for("alice", "s3cr3t");
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        match s.check(&ctx).await {
            CheckOutcome::Granted(identity) => {
                assert_eq!(identity.user, "alice");
                assert_eq!(identity.method, METHOD);
                assert_eq!(identity.groups, vec!["ops".to_string()]);
            }
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_password_is_definitive_rejection() {
        let s = strategy();
        let headers = header_for("alice", "wrong");
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::Rejected));
    }

    #[tokio::test]
    async fn unknown_user_is_definitive_rejection() {
        let s = strategy();
        let headers = header_for("mallory", "s3cr3t");
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::Rejected));
    }

    #[tokio::test]
    async fn other_scheme_falls_through() {
        let s = strategy();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::TryNext));
    }

    #[tokio::test]
    async fn missing_header_falls_through() {
        let s = strategy();
        let headers = HeaderMap::new();
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::TryNext));
    }

    #[tokio::test]
    async fn malformed_base64_is_definitive_rejection() {
        let s = strategy();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic not-base64!"));
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        assert!(matches!(s.check(&ctx).await, CheckOutcome::Rejected));
    }

    #[test]
    fn disabled_config_leaves_strategy_disabled() {
        let cfg = ListenerConfig::from_toml_str(
            r#"
            [auth.basic]
            enabled = false
            "#,
        )
        .unwrap();

        let mut s = BasicStrategy::new();
        s.init(&cfg).unwrap();
        assert!(!s.enabled());
    }

    #[test]
    fn init_is_idempotent() {
        let cfg = listener_config();
        let mut s = BasicStrategy::new();
        s.init(&cfg).unwrap();
        s.init(&cfg).unwrap();
        assert!(s.enabled());
    }
}
