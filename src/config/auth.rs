use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::authz::PermissionMap;

/// Authentication configuration for one listener.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// User store shared by all strategies.
    #[serde(default)]
    pub users: HashMap<String, UserConfig>,

    /// HTTP Basic strategy settings; absent means disabled.
    #[serde(default)]
    pub basic: Option<BasicAuthConfig>,

    /// Bearer-token strategy settings; absent means disabled.
    #[serde(default)]
    pub bearer: Option<BearerAuthConfig>,

    /// Negotiated-protocol strategy settings; absent means disabled.
    #[serde(default)]
    pub negotiate: Option<NegotiateAuthConfig>,

    /// Path patterns requiring authentication, each with its permission map.
    #[serde(default)]
    pub endpoints: HashMap<String, PermissionMap>,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bearer) = self.bearer.as_ref().filter(|c| c.enabled) {
            if bearer.secret.is_empty() {
                return Err(ConfigError::Validation(
                    "auth.bearer.secret cannot be empty when bearer auth is enabled".into(),
                ));
            }
            if bearer.lifetime_secs == 0 {
                return Err(ConfigError::Validation(
                    "auth.bearer.lifetime_secs must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

/// One entry in the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Hex-encoded SHA-512 of `password + username`.
    pub password: String,

    /// Groups referenced by `@group` permission keys.
    #[serde(default)]
    pub groups: Vec<String>,
}

/// HTTP Basic strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Chain priority; lower runs earlier.
    #[serde(default = "default_basic_score")]
    pub score: i32,
}

/// Bearer-token strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BearerAuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_bearer_score")]
    pub score: i32,

    /// HS256 signing secret.
    #[serde(default)]
    pub secret: String,

    /// Issued-token lifetime in seconds.
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,
}

/// Negotiated-protocol strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NegotiateAuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_negotiate_score")]
    pub score: i32,
}

fn default_true() -> bool {
    true
}

// Default chain order: negotiate, bearer, basic.
fn default_negotiate_score() -> i32 {
    10
}

fn default_bearer_score() -> i32 {
    20
}

fn default_basic_score() -> i32 {
    30
}

fn default_lifetime_secs() -> u64 {
    3600
}
