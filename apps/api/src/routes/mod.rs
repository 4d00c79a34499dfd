pub mod health;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::auth::handlers as auth;
use crate::cache::Ttl;
use crate::middleware::{
    cache_get_responses, invalidate_on_success, InvalidationPolicy, ResponseCachePolicy,
};
use crate::recruiting::handlers as recruiting;
use crate::state::AppState;

const CV_INTELLIGENCE: &str = "/api/v1/cv-intelligence";
const SUPPORT: &str = "/api/v1/support";
const ANALYTICS_PATTERN: &str = "api:/api/v1/analytics*";

pub fn build_router(state: AppState) -> Router {
    let ttl = state.config.cache.ttl;
    let cache = state.cache.clone();
    let skip_paths: Arc<[String]> = Arc::from(state.config.cache.skip_paths.clone());
    let cached = |ttl: Ttl| {
        from_fn_with_state(
            ResponseCachePolicy::new(cache.clone(), ttl, skip_paths.clone()),
            cache_get_responses,
        )
    };
    let invalidates = |base_path: &str| {
        from_fn_with_state(
            InvalidationPolicy::new(cache.clone())
                .with_base_path(base_path)
                .with_patterns([ANALYTICS_PATTERN]),
            invalidate_on_success,
        )
    };

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/cache/health", get(health::cache_health_handler))
        // Analysis (memoized by the gateway, not by the HTTP layer)
        .route(
            "/api/v1/cv-intelligence/analyze",
            post(analysis::handle_analyze_cv),
        )
        .route(
            "/api/v1/cv-intelligence/jd/analyze",
            post(analysis::handle_analyze_jd),
        )
        .route(
            "/api/v1/cv-intelligence/rank",
            post(analysis::handle_rank_candidates),
        )
        // Candidate batches
        .route(
            "/api/v1/cv-intelligence/batches",
            get(recruiting::handle_list_batches)
                .post(recruiting::handle_create_batch)
                .layer(cached(ttl.api))
                .layer(invalidates(CV_INTELLIGENCE)),
        )
        .route(
            "/api/v1/cv-intelligence/batches/:id",
            get(recruiting::handle_get_batch).layer(cached(ttl.api)),
        )
        // Support tickets
        .route(
            "/api/v1/support/tickets",
            get(recruiting::handle_list_tickets)
                .post(recruiting::handle_create_ticket)
                .layer(cached(ttl.api_user))
                .layer(invalidates(SUPPORT)),
        )
        .route(
            "/api/v1/support/tickets/:id",
            patch(recruiting::handle_update_ticket_status).layer(invalidates(SUPPORT)),
        )
        .route(
            "/api/v1/analytics/overview",
            get(recruiting::handle_analytics_overview).layer(cached(ttl.api_aggregate)),
        )
        // Per-caller routes; the cache layer passes them through via the skip-list
        .route(
            "/api/v1/auth/session",
            get(auth::handle_get_session)
                .put(auth::handle_put_session)
                .delete(auth::handle_delete_session)
                .layer(cached(ttl.api_user)),
        )
        .route(
            "/api/v1/auth/profile",
            get(auth::handle_profile).layer(cached(ttl.api_user)),
        )
        .with_state(state)
}
