use std::sync::Arc;

use crate::analysis::AnalysisGateway;
use crate::cache::{CacheStore, SessionCache};
use crate::config::Config;
use crate::recruiting::{BatchRepository, TicketRepository};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Fail-open store shared by the gateway and the HTTP cache layers.
    pub cache: CacheStore,
    pub gateway: Arc<AnalysisGateway>,
    pub sessions: SessionCache,
    pub batches: Arc<dyn BatchRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub config: Config,
}
