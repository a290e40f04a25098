//! The authentication chain: strategies kept sorted by score, dispatched
//! sequentially, challenge headers aggregated.

use std::sync::Arc;

use http::{HeaderMap, HeaderValue, StatusCode, header};
use tokio::sync::RwLock;

use super::{AuthError, AuthStrategy, CheckOutcome, Identity, RequestContext};
use crate::{authz::PermissionMap, config::ListenerConfig};

/// Outcome of running the whole chain for one request.
#[derive(Debug)]
pub enum ChainVerdict {
    /// No strategies registered: the request passes through without an
    /// identity.
    Open,
    /// A strategy produced an identity and the endpoint permissions allow it.
    Granted(Identity),
    /// No strategy found applicable credentials. The client should be
    /// challenged with the aggregated `WWW-Authenticate` headers.
    Unauthorized,
    /// Credentials were definitively rejected, or a real identity lacks
    /// permission for the endpoint.
    Forbidden,
}

impl ChainVerdict {
    /// HTTP status for failure verdicts; `None` when the request proceeds.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ChainVerdict::Open | ChainVerdict::Granted(_) => None,
            ChainVerdict::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ChainVerdict::Forbidden => Some(StatusCode::FORBIDDEN),
        }
    }

    /// Generic client-facing message for failure verdicts.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ChainVerdict::Open | ChainVerdict::Granted(_) => None,
            ChainVerdict::Unauthorized => Some("Unauthorized"),
            ChainVerdict::Forbidden => Some("Forbidden"),
        }
    }
}

/// Ordered registry of authentication strategies for one listener.
///
/// Owned by the listener instance, never process-wide: independent listeners
/// each hold their own chain. Reads vastly outnumber mutations, so the list
/// sits behind a reader/writer lock; insertion happens at startup (and via
/// the runtime extension point) only.
pub struct StrategyChain {
    cfg: Arc<ListenerConfig>,
    list: RwLock<Vec<Box<dyn AuthStrategy>>>,
}

impl StrategyChain {
    pub fn new(cfg: Arc<ListenerConfig>) -> Self {
        Self {
            cfg,
            list: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.cfg
    }

    /// Initialize and register a strategy.
    ///
    /// `init` failures propagate; a strategy whose `enabled()` is false after
    /// a successful `init` is silently dropped and never consulted. The list
    /// stays sorted ascending by score, insertion order preserved for equal
    /// scores.
    pub async fn add(&self, mut strategy: Box<dyn AuthStrategy>) -> Result<(), AuthError> {
        strategy.init(&self.cfg)?;
        if !strategy.enabled() {
            return Ok(());
        }

        let mut list = self.list.write().await;
        let score = strategy.score();
        let at = list.partition_point(|s| s.score() <= score);
        list.insert(at, strategy);
        Ok(())
    }

    /// Whether any strategy is registered.
    pub async fn is_enabled(&self) -> bool {
        !self.list.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.list.read().await.len()
    }

    /// Run the chain against one request.
    ///
    /// Strategies run in score order. The first identity whose permissions
    /// allow the endpoint wins immediately. A real identity that the
    /// permissions deny terminates the chain with `Forbidden`; later
    /// strategies are not consulted. A definitive rejection also terminates
    /// with `Forbidden`. Only `TryNext` continues.
    pub async fn check(
        &self,
        ctx: &RequestContext<'_>,
        permissions: &PermissionMap,
    ) -> ChainVerdict {
        let list = self.list.read().await;
        if list.is_empty() {
            return ChainVerdict::Open;
        }

        for strategy in list.iter() {
            match strategy.check(ctx).await {
                CheckOutcome::Granted(identity) => {
                    if permissions.allows(&identity) {
                        tracing::debug!(
                            request_id = ctx.id,
                            user = %identity.user,
                            method = identity.method,
                            "request authenticated"
                        );
                        return ChainVerdict::Granted(identity);
                    }
                    tracing::info!(
                        request_id = ctx.id,
                        user = %identity.user,
                        method = identity.method,
                        path = ctx.path,
                        "identity denied by endpoint permissions"
                    );
                    return ChainVerdict::Forbidden;
                }
                CheckOutcome::Rejected => return ChainVerdict::Forbidden,
                CheckOutcome::TryNext => continue,
            }
        }

        ChainVerdict::Unauthorized
    }

    /// Append one `WWW-Authenticate` header per registered strategy that
    /// advertises a scheme, so the client sees all acceptable schemes.
    pub async fn write_challenge_headers(&self, headers: &mut HeaderMap, prefix: &str, path: &str) {
        for strategy in self.list.read().await.iter() {
            let Some(challenge) = strategy.www_auth_header() else {
                continue;
            };

            let value = if challenge.with_realm {
                format!(r#"{} realm="{prefix}{path}""#, challenge.scheme)
            } else {
                challenge.scheme.to_string()
            };

            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.append(header::WWW_AUTHENTICATE, value);
                }
                Err(error) => tracing::warn!(
                    %error,
                    scheme = challenge.scheme,
                    "skipping unencodable challenge header"
                ),
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn scores(&self) -> Vec<i32> {
        self.list.read().await.iter().map(|s| s.score()).collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::auth::Challenge;

    /// Scripted strategy for chain tests.
    struct FakeStrategy {
        scheme: &'static str,
        score: i32,
        enabled: bool,
        init_error: bool,
        outcome: fn() -> CheckOutcome,
    }

    impl FakeStrategy {
        fn new(score: i32, outcome: fn() -> CheckOutcome) -> Box<Self> {
            Box::new(Self {
                scheme: "Fake",
                score,
                enabled: true,
                init_error: false,
                outcome,
            })
        }
    }

    #[async_trait]
    impl AuthStrategy for FakeStrategy {
        fn init(&mut self, _cfg: &ListenerConfig) -> Result<(), AuthError> {
            if self.init_error {
                return Err(AuthError::Misconfigured {
                    strategy: "fake",
                    reason: "scripted failure".into(),
                });
            }
            Ok(())
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn score(&self) -> i32 {
            self.score
        }

        fn www_auth_header(&self) -> Option<Challenge> {
            Some(Challenge {
                scheme: self.scheme,
                with_realm: true,
            })
        }

        async fn check(&self, _ctx: &RequestContext<'_>) -> CheckOutcome {
            (self.outcome)()
        }
    }

    fn chain() -> StrategyChain {
        StrategyChain::new(Arc::new(ListenerConfig::default()))
    }

    fn try_next() -> CheckOutcome {
        CheckOutcome::TryNext
    }

    fn rejected() -> CheckOutcome {
        CheckOutcome::Rejected
    }

    fn granted() -> CheckOutcome {
        CheckOutcome::Granted(Identity::new("fake", "alice"))
    }

    fn allow_alice() -> PermissionMap {
        [("alice", true)].into_iter().collect()
    }

    #[rstest]
    #[case(&[10, 20, 30, 40, 50])]
    #[case(&[50, 40, 30, 20, 10])]
    #[case(&[50, 10, 30, 20, 40])]
    #[case(&[10, 10, 10, 10, 10])]
    #[case(&[30, 10, 20, 10, 40])]
    #[tokio::test]
    async fn insertion_keeps_scores_non_decreasing(#[case] scores: &[i32]) {
        let chain = chain();
        for &score in scores {
            chain.add(FakeStrategy::new(score, try_next)).await.unwrap();
        }

        let ordered = chain.scores().await;
        assert!(
            ordered.windows(2).all(|w| w[0] <= w[1]),
            "scores {scores:?} produced order {ordered:?}"
        );
        assert_eq!(ordered.len(), scores.len());
    }

    #[tokio::test]
    async fn disabled_strategy_is_never_added() {
        let chain = chain();
        let mut strategy = FakeStrategy::new(10, try_next);
        strategy.enabled = false;

        chain.add(strategy).await.unwrap();
        assert!(!chain.is_enabled().await);
    }

    #[tokio::test]
    async fn init_failure_propagates_and_skips_registration() {
        let chain = chain();
        let mut strategy = FakeStrategy::new(10, try_next);
        strategy.init_error = true;

        assert!(chain.add(strategy).await.is_err());
        assert!(!chain.is_enabled().await);
    }

    #[tokio::test]
    async fn empty_chain_passes_through() {
        let chain = chain();
        let headers = HeaderMap::new();
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        let verdict = chain.check(&ctx, &allow_alice()).await;
        assert!(matches!(verdict, ChainVerdict::Open));
    }

    #[tokio::test]
    async fn first_authorized_identity_wins() {
        let chain = chain();
        chain.add(FakeStrategy::new(10, try_next)).await.unwrap();
        chain.add(FakeStrategy::new(20, granted)).await.unwrap();
        // Would also grant, but must never be reached.
        chain.add(FakeStrategy::new(30, rejected)).await.unwrap();

        let headers = HeaderMap::new();
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        match chain.check(&ctx, &allow_alice()).await {
            ChainVerdict::Granted(identity) => assert_eq!(identity.user, "alice"),
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn denied_identity_terminates_with_forbidden() {
        let chain = chain();
        chain.add(FakeStrategy::new(10, granted)).await.unwrap();
        // A weaker strategy must not get a second chance after a real
        // identity was denied.
        chain.add(FakeStrategy::new(20, granted)).await.unwrap();

        let headers = HeaderMap::new();
        let ctx = RequestContext::new(1, "", "/x", &headers, None);
        let deny: PermissionMap = [("alice", false)].into_iter().collect();

        let verdict = chain.check(&ctx, &deny).await;
        assert!(matches!(verdict, ChainVerdict::Forbidden));
        assert_eq!(verdict.status_code(), Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn definitive_rejection_stops_the_chain() {
        let chain = chain();
        chain.add(FakeStrategy::new(10, rejected)).await.unwrap();
        chain.add(FakeStrategy::new(20, granted)).await.unwrap();

        let headers = HeaderMap::new();
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        let verdict = chain.check(&ctx, &allow_alice()).await;
        assert!(matches!(verdict, ChainVerdict::Forbidden));
    }

    #[tokio::test]
    async fn exhausted_chain_is_unauthorized() {
        let chain = chain();
        chain.add(FakeStrategy::new(10, try_next)).await.unwrap();
        chain.add(FakeStrategy::new(20, try_next)).await.unwrap();

        let headers = HeaderMap::new();
        let ctx = RequestContext::new(1, "", "/x", &headers, None);

        let verdict = chain.check(&ctx, &allow_alice()).await;
        assert!(matches!(verdict, ChainVerdict::Unauthorized));
        assert_eq!(verdict.status_code(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn challenge_headers_aggregate_in_chain_order() {
        let chain = chain();
        let mut first = FakeStrategy::new(10, try_next);
        first.scheme = "Negotiate";
        let mut second = FakeStrategy::new(20, try_next);
        second.scheme = "Basic";
        chain.add(first).await.unwrap();
        chain.add(second).await.unwrap();

        let mut headers = HeaderMap::new();
        chain
            .write_challenge_headers(&mut headers, "/gw", "/admin")
            .await;

        let values: Vec<_> = headers
            .get_all(header::WWW_AUTHENTICATE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            values,
            vec![
                r#"Negotiate realm="/gw/admin""#.to_string(),
                r#"Basic realm="/gw/admin""#.to_string(),
            ]
        );
    }
}
