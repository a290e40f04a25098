//! Per-endpoint permission maps.
//!
//! A permission map associates identity keys with a grant/deny flag:
//!
//! - a literal username (`"alice"`);
//! - a group name prefixed with `@` (`"@ops"`);
//! - the wildcard `*`.
//!
//! Evaluation precedence is security-critical and fixed: explicit user entry
//! first (its flag is final, even when `false`), then group entries, then the
//! wildcard. An empty map always denies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// Identity-key to grant-flag mapping for one endpoint pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(HashMap<String, bool>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, allowed: bool) {
        self.0.insert(key.into(), allowed);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decide whether `identity` may access the endpoint this map guards.
    ///
    /// Group evaluation requires consensus: every `@group` entry matching one
    /// of the identity's groups must be `true`. A single explicit `false`
    /// among matched groups denies, regardless of other grants. Access is
    /// granted only if at least one group matched and none denied.
    pub fn allows(&self, identity: &Identity) -> bool {
        if self.0.is_empty() {
            return false;
        }

        if let Some(&allowed) = self.0.get(&identity.user) {
            return allowed;
        }

        if !identity.groups.is_empty() {
            let mut matched = false;

            for group in &identity.groups {
                if let Some(&allowed) = self.0.get(&format!("@{group}")) {
                    if !allowed {
                        return false;
                    }
                    matched = true;
                }
            }

            if matched {
                return true;
            }
        }

        if let Some(&allowed) = self.0.get("*") {
            return allowed;
        }

        false
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn identity(user: &str, groups: &[&str]) -> Identity {
        Identity::new("test", user).with_groups(groups.iter().map(|g| g.to_string()))
    }

    fn map(entries: &[(&str, bool)]) -> PermissionMap {
        entries.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn empty_map_denies() {
        assert!(!PermissionMap::new().allows(&identity("alice", &["ops"])));
    }

    #[rstest]
    // Explicit user entry is final, even when false.
    #[case(&[("alice", true)], "alice", &[], true)]
    #[case(&[("alice", false), ("*", true)], "alice", &[], false)]
    #[case(&[("alice", false), ("@ops", true)], "alice", &["ops"], false)]
    // Group match without a user entry.
    #[case(&[("@ops", true), ("*", false)], "alice", &["ops"], true)]
    #[case(&[("@ops", false), ("*", true)], "alice", &["ops"], false)]
    // Consensus across multiple matched groups: any false denies.
    #[case(&[("@ops", true), ("@interns", false)], "bob", &["ops", "interns"], false)]
    #[case(&[("@ops", true), ("@dev", true)], "bob", &["ops", "dev"], true)]
    // No group matched: fall through to the wildcard.
    #[case(&[("@ops", true), ("*", true)], "bob", &["dev"], true)]
    #[case(&[("@ops", true)], "bob", &["dev"], false)]
    // Wildcard fallback for identities without groups.
    #[case(&[("*", true)], "carol", &[], true)]
    #[case(&[("*", false)], "carol", &[], false)]
    fn precedence(
        #[case] entries: &[(&str, bool)],
        #[case] user: &str,
        #[case] groups: &[&str],
        #[case] expected: bool,
    ) {
        assert_eq!(map(entries).allows(&identity(user, groups)), expected);
    }
}
