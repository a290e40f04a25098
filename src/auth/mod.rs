//! Authentication: the strategy contract, the reference strategies and the
//! score-ordered chain that dispatches them.

pub mod basic;
pub mod bearer;
mod chain;
mod error;
mod identity;
pub mod negotiate;
mod strategy;

pub use basic::BasicStrategy;
pub use bearer::{BearerStrategy, issue_token};
pub use chain::{ChainVerdict, StrategyChain};
pub use error::{AuthError, ErrorResponse};
pub use identity::Identity;
pub use negotiate::{ContextValidator, NegotiateStrategy, NegotiatedContext};
use sha2::{Digest, Sha512};
pub use strategy::{AuthStrategy, Challenge, CheckOutcome, RequestContext};
use subtle::ConstantTimeEq;

/// Hex-encoded SHA-512 of `password + salt`. The user store keeps passwords
/// in this form, salted with the username.
pub fn credential_hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time check of a presented password against a stored hex digest.
pub(crate) fn verify_credential(password: &str, user: &str, stored_hex: &str) -> bool {
    let Ok(stored) = hex::decode(stored_hex) else {
        return false;
    };

    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    hasher.update(user.as_bytes());
    let computed = hasher.finalize();

    computed.ct_eq(stored.as_slice()).into()
}
