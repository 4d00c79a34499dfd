use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::cache::CacheDiagnostics;
use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME")
    }))
}

/// GET /api/v1/cache/health
/// Never fails; an unreachable store reports `connected: false`.
pub async fn cache_health_handler(State(state): State<AppState>) -> Json<CacheDiagnostics> {
    Json(state.cache.diagnostics().await)
}
