//! Path-pattern rule sets.
//!
//! A [`RuleSet`] maps path patterns to values (a permission map for
//! auth-required endpoints, a marker for disabled endpoints) and resolves the
//! most specific pattern covering a concrete request path.
//!
//! Pattern syntax:
//! - `/a/b` — exact path;
//! - `/a/b*` — the path itself and everything below it;
//! - `/a/b/*` — strict descendants only, never `/a/b` itself;
//! - `!` prefix on any of the above — explicit exclusion;
//! - bare `*` — everything not otherwise excluded.
//!
//! Matching walks from the full path towards the root, one segment at a
//! time, so a deeper match always beats a shallower one. At each specificity
//! level the negated form is probed before the positive form: a narrow
//! exclusion beats an inclusion rooted at the same depth, while a deeper
//! inclusion still beats a shallower exclusion.

use std::collections::{HashMap, HashSet};

/// Result of resolving a request path against a [`RuleSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternMatch<'a, T> {
    /// A positive pattern covers the path.
    Matched { pattern: &'a str, value: &'a T },
    /// A `!`-prefixed pattern covers the path; the pattern is reported
    /// without its `!` prefix.
    Excluded { pattern: &'a str },
    /// No pattern covers the path.
    NoMatch,
}

impl<T> PatternMatch<'_, T> {
    /// The matched value, if the path resolved to a positive pattern.
    pub fn value(&self) -> Option<&T> {
        match self {
            PatternMatch::Matched { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Pattern-keyed rule map with wildcard and negation support.
#[derive(Debug, Clone, Default)]
pub struct RuleSet<T> {
    positive: HashMap<String, T>,
    /// Negated patterns, stored without the leading `!`.
    negated: HashSet<String>,
}

impl<T> RuleSet<T> {
    pub fn new() -> Self {
        Self {
            positive: HashMap::new(),
            negated: HashSet::new(),
        }
    }

    /// Insert a rule. A leading `!` marks the pattern as an exclusion; the
    /// value is irrelevant for exclusions and is dropped.
    pub fn insert(&mut self, pattern: impl Into<String>, value: T) {
        let pattern = pattern.into();
        match pattern.strip_prefix('!') {
            Some(rest) => {
                self.negated.insert(rest.to_string());
            }
            None => {
                self.positive.insert(pattern, value);
            }
        }
    }

    /// Remove a rule previously inserted under `pattern`.
    pub fn remove(&mut self, pattern: &str) {
        match pattern.strip_prefix('!') {
            Some(rest) => {
                self.negated.remove(rest);
            }
            None => {
                self.positive.remove(pattern);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negated.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positive.len() + self.negated.len()
    }

    /// Resolve the most specific rule covering `path`.
    ///
    /// Exact entries are consulted only for the full path; wildcard entries
    /// are probed while stripping trailing segments; the bare `*` rule is the
    /// final fallback.
    pub fn lookup(&self, path: &str) -> PatternMatch<'_, T> {
        if self.is_empty() {
            return PatternMatch::NoMatch;
        }

        if let Some(pattern) = self.negated.get(path) {
            return PatternMatch::Excluded { pattern };
        }
        if let Some((pattern, value)) = self.positive.get_key_value(path) {
            return PatternMatch::Matched { pattern, value };
        }

        let mut prefix = path;
        let mut depth = 0usize;

        loop {
            depth += 1;

            // `/*` never matches the path it is rooted at, only strict
            // descendants, so it is probed only once a segment has been
            // stripped.
            if depth > 1
                && let Some(m) = self.probe(&format!("{prefix}/*"))
            {
                return m;
            }

            if let Some(m) = self.probe(&format!("{prefix}*")) {
                return m;
            }

            let Some(cut) = prefix.rfind('/') else {
                break;
            };
            prefix = &prefix[..cut];
            if prefix.is_empty() {
                break;
            }
        }

        if let Some((pattern, value)) = self.positive.get_key_value("*") {
            return PatternMatch::Matched { pattern, value };
        }

        PatternMatch::NoMatch
    }

    fn probe(&self, key: &str) -> Option<PatternMatch<'_, T>> {
        if let Some(pattern) = self.negated.get(key) {
            return Some(PatternMatch::Excluded { pattern });
        }
        self.positive
            .get_key_value(key)
            .map(|(pattern, value)| PatternMatch::Matched { pattern, value })
    }
}

impl<T> FromIterator<(String, T)> for RuleSet<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut rules = Self::new();
        for (pattern, value) in iter {
            rules.insert(pattern, value);
        }
        rules
    }
}

impl<T> From<HashMap<String, T>> for RuleSet<T> {
    fn from(map: HashMap<String, T>) -> Self {
        map.into_iter().collect()
    }
}
