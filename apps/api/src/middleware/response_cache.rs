use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::{keys, CacheStore, Ttl};

pub const X_CACHE: &str = "x-cache";

/// Per-route configuration for [`cache_get_responses`].
#[derive(Clone)]
pub struct ResponseCachePolicy {
    cache: CacheStore,
    ttl: Ttl,
    skip_paths: Arc<[String]>,
}

impl ResponseCachePolicy {
    pub fn new(cache: CacheStore, ttl: Ttl, skip_paths: Arc<[String]>) -> Self {
        Self {
            cache,
            ttl,
            skip_paths,
        }
    }

    /// Per-caller paths whose content must never be shared through the cache.
    fn is_skipped(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|s| path.contains(s.as_str()))
    }
}

/// GET response cache. A disabled store makes it a pass-through.
///
/// A hit answers from the store without running the handler. A miss runs
/// the handler and, when the status is exactly 200 with a JSON body, writes
/// the body back in a detached task so the client is never delayed by it.
pub async fn cache_get_responses(
    State(policy): State<ResponseCachePolicy>,
    request: Request,
    next: Next,
) -> Response {
    if !policy.cache.is_enabled()
        || request.method() != Method::GET
        || policy.is_skipped(request.uri().path())
    {
        return next.run(request).await;
    }

    let key = keys::api_key(request.uri().path(), &query_params(request.uri().query()));

    if let Some(body) = policy.cache.get::<Value>(&key).await {
        debug!(key = %key, "response cache hit");
        return ([(X_CACHE, HeaderValue::from_static("HIT"))], Json(body)).into_response();
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK || !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(key = %key, "failed to buffer handler response: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => {
            let cache = policy.cache.clone();
            let ttl = policy.ttl;
            tokio::spawn(async move {
                if !cache.set_with_ttl(&key, &value, ttl).await {
                    warn!(key = %key, "response not cached");
                }
            });
            parts
                .headers
                .insert(X_CACHE, HeaderValue::from_static("MISS"));
        }
        Err(e) => warn!(key = %key, "handler returned invalid JSON, not caching: {e}"),
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Query string as a JSON object; repeated names become arrays.
pub fn query_params(query: Option<&str>) -> Value {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(query) = query {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }

    Value::Object(
        params
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() == 1 {
                    Value::String(values.remove(0))
                } else {
                    Value::Array(values.into_iter().map(Value::String).collect())
                };
                (name, value)
            })
            .collect(),
    )
}
