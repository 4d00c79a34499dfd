mod analysis;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod llm_client;
mod middleware;
mod models;
mod recruiting;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::AnalysisGateway;
use crate::cache::{CacheStore, SessionCache};
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::recruiting::{
    BatchRepository, MemoryBatchRepository, MemoryTicketRepository, PgBatchRepository,
    PgTicketRepository, TicketRepository,
};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting recruit API v{}", env!("CARGO_PKG_VERSION"));

    // Cache store: absent or unreachable degrades to pass-through
    let cache = CacheStore::connect(&config.cache).await;

    // Storage: PostgreSQL when configured, process-local otherwise
    let (batches, tickets): (Arc<dyn BatchRepository>, Arc<dyn TicketRepository>) =
        match &config.database_url {
            Some(url) => {
                let db = create_pool(url).await?;
                ensure_schema(&db).await?;
                (
                    Arc::new(PgBatchRepository::new(db.clone())),
                    Arc::new(PgTicketRepository::new(db)),
                )
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory repositories");
                (
                    Arc::new(MemoryBatchRepository::default()),
                    Arc::new(MemoryTicketRepository::default()),
                )
            }
        };

    // Initialize LLM client
    let llm = LlmClient::new(&config.llm)?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm.model());
    } else {
        warn!("LLM_API_KEY not set, every analysis will use the local fallback");
    }

    let state = AppState {
        gateway: Arc::new(AnalysisGateway::new(
            cache.clone(),
            Arc::new(llm),
            config.cache.ttl,
        )),
        sessions: SessionCache::new(cache.clone(), config.cache.ttl.session),
        cache: cache.clone(),
        batches,
        tickets,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
