use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::cache::{keys, CacheStore};

/// Per-route configuration for [`invalidate_on_success`].
///
/// Patterns evicted after a successful mutation:
/// - `api:<request path>*`, always;
/// - `api:<base path>*`, when a base path is set;
/// - every explicit pattern, for cross-resource invalidation.
#[derive(Clone)]
pub struct InvalidationPolicy {
    cache: CacheStore,
    base_path: Option<Arc<str>>,
    patterns: Arc<[String]>,
}

impl InvalidationPolicy {
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache,
            base_path: None,
            patterns: Arc::from(Vec::new()),
        }
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = Some(Arc::from(base_path));
        self
    }

    /// Adds explicit glob patterns, e.g. `api:/api/v1/analytics*`.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = self.patterns.to_vec();
        all.extend(patterns.into_iter().map(Into::into));
        self.patterns = Arc::from(all);
        self
    }

    pub fn patterns_for(&self, path: &str) -> Vec<String> {
        let mut patterns = Vec::with_capacity(self.patterns.len() + 2);
        if let Some(base) = self.base_path.as_deref() {
            patterns.push(keys::api_prefix_pattern(base));
        }
        let own = keys::api_prefix_pattern(path);
        if !patterns.contains(&own) {
            patterns.push(own);
        }
        for pattern in self.patterns.iter() {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        patterns
    }
}

fn is_mutation(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Write-through invalidation for mutating routes.
///
/// The handler always runs untouched. Only a 2xx outcome schedules the
/// deletes, in a detached task; failures are logged and stale entries then
/// live until their natural TTL.
pub async fn invalidate_on_success(
    State(policy): State<InvalidationPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if !is_mutation(request.method()) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if response.status().is_success() && policy.cache.is_enabled() {
        let patterns = policy.patterns_for(&path);
        let cache = policy.cache.clone();
        tokio::spawn(async move {
            for pattern in patterns {
                if cache.delete_by_pattern(&pattern).await {
                    debug!(pattern = %pattern, "cache invalidated");
                } else {
                    warn!(pattern = %pattern, "cache invalidation failed; stale reads possible until TTL expiry");
                }
            }
        });
    }

    response
}
