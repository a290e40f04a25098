//! Bearer-token authentication (HS256 JWT).
//!
//! Tokens are signed with the listener's shared secret and carry a
//! `username` claim resolved against the user store. [`issue_token`] is the
//! counterpart used by a login endpoint to mint tokens for password-verified
//! users.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{
    AuthError, AuthStrategy, Challenge, CheckOutcome, Identity, RequestContext, verify_credential,
};
use crate::config::{AuthConfig, BearerAuthConfig, ListenerConfig, UserConfig};

pub(crate) const METHOD: &str = "bearer";
const SCHEME: &str = "Bearer";

/// Claims carried by tokens this strategy accepts and issues.
#[derive(Debug, Serialize, Deserialize)]
struct BearerClaims {
    username: String,
    exp: u64,
}

/// Bearer-token authentication strategy.
#[derive(Default)]
pub struct BearerStrategy {
    cfg: Option<BearerAuthConfig>,
    users: HashMap<String, UserConfig>,
}

impl BearerStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStrategy for BearerStrategy {
    fn init(&mut self, cfg: &ListenerConfig) -> Result<(), AuthError> {
        self.cfg = None;
        self.users.clear();

        let Some(bearer) = cfg.auth.bearer.as_ref().filter(|c| c.enabled) else {
            return Ok(());
        };

        if bearer.secret.is_empty() {
            return Err(AuthError::Misconfigured {
                strategy: METHOD,
                reason: "secret cannot be empty".into(),
            });
        }

        self.cfg = Some(bearer.clone());
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
            with_realm: false,
        })
    }

    async fn check(&self, ctx: &RequestContext<'_>) -> CheckOutcome {
        let Some(cfg) = &self.cfg else {
            return CheckOutcome::TryNext;
        };

        let Some((scheme, token)) = ctx.authorization() else {
            return CheckOutcome::TryNext;
        };
        if scheme != SCHEME {
            return CheckOutcome::TryNext;
        }

        let key = DecodingKey::from_secret(cfg.secret.as_bytes());
        let data = match decode::<BearerClaims>(token, &key, &Validation::new(Algorithm::HS256)) {
            Ok(data) => data,
            Err(error) => {
                tracing::info!(request_id = ctx.id, %error, "bearer login error");
                return CheckOutcome::Rejected;
            }
        };

        let user = data.claims.username;
        let Some(def) = self.users.get(&user) else {
            tracing::info!(
                request_id = ctx.id,
                user = %user,
                "bearer login error: unknown user"
            );
            return CheckOutcome::Rejected;
        };

        CheckOutcome::Granted(Identity::new(METHOD, user).with_groups(def.groups.clone()))
    }
}

/// Mint a token for `user` after verifying the password against the user
/// store. Backs a login endpoint in the surrounding router.
pub fn issue_token(auth: &AuthConfig, user: &str, password: &str) -> Result<String, AuthError> {
    let Some(cfg) = auth.bearer.as_ref().filter(|c| c.enabled) else {
        return Err(AuthError::Misconfigured {
            strategy: METHOD,
            reason: "bearer auth is disabled".into(),
        });
    };

    let verified = auth
        .users
        .get(user)
        .is_some_and(|def| verify_credential(password, user, &def.password));
    if !verified {
        return Err(AuthError::InvalidLogin);
    }

    let claims = BearerClaims {
        username: user.to_string(),
        exp: (Utc::now() + chrono::Duration::seconds(cfg.lifetime_secs as i64)).timestamp() as u64,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )?)
}
