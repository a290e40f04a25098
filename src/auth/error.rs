use serde::{Deserialize, Serialize};

/// Errors surfaced by strategy initialization and token issuance.
///
/// Per-request authentication failures are never errors: they resolve into
/// [`super::CheckOutcome`] values inside the chain.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A strategy's configuration is malformed or incomplete. Aborts startup
    /// for that strategy only; the rest of the chain still loads.
    #[error("auth strategy {strategy:?} is misconfigured: {reason}")]
    Misconfigured {
        strategy: &'static str,
        reason: String,
    },

    /// Login or password rejected during token issuance. The client-facing
    /// message stays generic to avoid user enumeration.
    #[error("invalid login or password")]
    InvalidLogin,

    /// Token signing failed.
    #[error("token encoding failed: {0}")]
    TokenEncoding(#[from] jsonwebtoken::errors::Error),
}

/// JSON body for error replies produced by the gate middleware.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
