//! Endpoint permission evaluation.

mod permissions;

pub use permissions::PermissionMap;
