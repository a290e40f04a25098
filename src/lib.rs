//! Embeddable HTTP request-authorization layer.
//!
//! Every inbound request passes through an [`AuthGate`] before reaching
//! application logic. The gate composes three pieces:
//!
//! - a path-pattern matcher ([`routing::RuleSet`]) deciding whether the
//!   request path requires authentication and with which permission set;
//! - a priority-ordered chain of pluggable authentication strategies
//!   ([`auth::StrategyChain`]) producing an [`auth::Identity`] or a
//!   definitive failure;
//! - a permission evaluator ([`authz::PermissionMap`]) deciding whether the
//!   identity is allowed on the target endpoint.
//!
//! The core rides on the `http` crate's request/response types; an axum
//! adapter is provided in [`middleware`].
//!
//! # Example
//!
//! ```toml
//! [auth.users.alice]
//! password = "..." # hex SHA-512 of password + username
//! groups = ["ops"]
//!
//! [auth.basic]
//! enabled = true
//!
//! [auth.endpoints."/admin/*"]
//! "@ops" = true
//! ```

pub mod auth;
pub mod authz;
pub mod config;
pub mod gate;
pub mod middleware;
pub mod routing;

pub use auth::{
    AuthError, AuthStrategy, Challenge, ChainVerdict, CheckOutcome, Identity, RequestContext,
    StrategyChain,
};
pub use authz::PermissionMap;
pub use config::{AuthConfig, ConfigError, ListenerConfig};
pub use gate::{AuthGate, GateDecision};
pub use routing::{PatternMatch, RuleSet};
