use std::{any::Any, fmt, sync::Arc};

/// Authenticated principal attached to a request.
///
/// Created only by a strategy's `check`, never mutated afterwards, and
/// discarded at the end of the request. Not persisted, not cached across
/// requests.
#[derive(Clone)]
pub struct Identity {
    /// Name of the strategy that produced this identity.
    pub method: &'static str,
    /// User identifier.
    pub user: String,
    /// Groups the user belongs to; order carries no meaning.
    pub groups: Vec<String>,
    /// Opaque strategy-specific payload, e.g. a negotiated security context.
    pub extra: Option<Arc<dyn Any + Send + Sync>>,
}

impl Identity {
    pub fn new(method: &'static str, user: impl Into<String>) -> Self {
        Self {
            method,
            user: user.into(),
            groups: Vec::new(),
            extra: None,
        }
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = String>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }

    pub fn with_extra(mut self, extra: Arc<dyn Any + Send + Sync>) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Downcast the strategy-specific payload.
    pub fn extra_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extra.as_deref().and_then(|e| e.downcast_ref())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("method", &self.method)
            .field("user", &self.user)
            .field("groups", &self.groups)
            .field("extra", &self.extra.as_ref().map(|_| "..."))
            .finish()
    }
}
