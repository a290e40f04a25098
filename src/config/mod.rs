//! Listener configuration.
//!
//! The gate is configured via a TOML section owned by the embedding host.
//!
//! # Example
//!
//! ```toml
//! prefix = "/gw"
//!
//! [auth.users.alice]
//! password = "..." # hex SHA-512 of password + username
//! groups = ["ops"]
//!
//! [auth.basic]
//! enabled = true
//! score = 30
//!
//! [auth.bearer]
//! enabled = true
//! secret = "${JWT_SECRET}"
//!
//! [auth.endpoints."/admin/*"]
//! "@ops" = true
//!
//! [disabled_endpoints]
//! "/debug/*" = true
//! ```

mod auth;

use std::collections::HashMap;

pub use auth::{
    AuthConfig, BasicAuthConfig, BearerAuthConfig, NegotiateAuthConfig, UserConfig,
};
use serde::{Deserialize, Serialize};

/// Configuration errors surfaced at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Per-listener configuration: strategy settings, the user store, endpoint
/// permission rules and disabled endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    /// Proxy prefix stripped from request paths before rule matching.
    /// Empty, or absolute without a trailing slash (`/gw`).
    #[serde(default)]
    pub prefix: String,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Endpoint patterns rejected outright (HTTP 423). Values exist so the
    /// map reads naturally in TOML; only `true` entries disable.
    #[serde(default)]
    pub disabled_endpoints: HashMap<String, bool>,
}

impl ListenerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if !self.prefix.is_empty() {
            if !self.prefix.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "prefix {:?} must start with '/'",
                    self.prefix
                )));
            }
            while self.prefix.ends_with('/') {
                self.prefix.pop();
            }
        }

        self.auth.validate()
    }
}
