//! Cache store adapter: the only path from the application to the shared
//! key-value store.
//!
//! Every public operation on [`CacheStore`] is fail-open: transport errors,
//! timeouts, corrupt values and a missing configuration all degrade to
//! cache-miss semantics and are reported through `tracing` only. A broken
//! cache makes requests slower, never wrong.
//!
//! Entries are never held in process memory; the backing store owns expiry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;

pub mod keys;
pub mod redis_backend;
pub mod session;
pub mod ttl;

#[cfg(test)]
pub mod testing;

pub use redis_backend::RedisBackend;
pub use session::SessionCache;
pub use ttl::{Ttl, TtlPolicy};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Raw capabilities required from the backing store.
///
/// Implementations may fail; [`CacheStore`] is what turns those failures
/// into misses.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError>;

    /// Resolves a glob pattern to the concrete keys it currently matches.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Deletes the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;

    async fn dbsize(&self) -> Result<u64, CacheError>;

    /// Raw `INFO <section>` text.
    async fn info(&self, section: &str) -> Result<String, CacheError>;

    /// Called when a command exceeded the store's command timeout and its
    /// future was dropped. A backend holding a connection should discard it.
    async fn on_timeout(&self) {}

    /// Releases any held connection. Later calls may reconnect.
    async fn shutdown(&self) {}
}

/// Store health snapshot for the diagnostics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheDiagnostics {
    pub enabled: bool,
    pub connected: bool,
    pub key_count: Option<u64>,
    pub used_memory: Option<String>,
}

/// Fail-open handle over an optional backend.
///
/// Cheap to clone; clones share the backend (and therefore its single
/// multiplexed connection). A handle without a backend is the disabled
/// null-object: reads miss, writes report `false`.
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    command_timeout: Duration,
}

impl CacheStore {
    /// A handle that caches nothing.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            command_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>, command_timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            command_timeout,
        }
    }

    /// Builds the process-wide store handle from configuration.
    ///
    /// No connection string yields a disabled handle. An unreachable store at
    /// start-up is only logged: the backend reconnects lazily on later calls.
    pub async fn connect(config: &CacheConfig) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!("REDIS_URL not set; response and analysis caching disabled");
            return Self::disabled();
        };

        let backend = match RedisBackend::new(url, config.connect_timeout) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Invalid cache connection string, caching disabled: {e}");
                return Self::disabled();
            }
        };

        let store = Self::with_backend(Arc::new(backend), config.command_timeout);
        if store.ping().await {
            info!("Cache store connected");
        } else {
            warn!("Cache store unreachable at start-up; will retry on demand");
        }
        store
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Fetches and deserializes a value. Any failure is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let raw = match self.run("GET", backend.get(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, "cache read failed, treating as miss: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "corrupt cached value, treating as miss: {e}");
                None
            }
        }
    }

    /// Serializes and stores a value with a TTL. Returns `false` on any failure.
    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Ttl) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, "cache value not serializable: {e}");
                return false;
            }
        };

        match self
            .run("SET", backend.set_ex(key, raw, ttl.as_secs()))
            .await
        {
            Ok(()) => {
                debug!(key, ttl_secs = ttl.as_secs(), "cache entry written");
                true
            }
            Err(e) => {
                warn!(key, "cache write failed: {e}");
                false
            }
        }
    }

    /// Deletes every key matching a glob pattern. Zero matches is a success.
    pub async fn delete_by_pattern(&self, pattern: &str) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        let keys = match self.run("KEYS", backend.keys(pattern)).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(pattern, "cache key scan failed: {e}");
                return false;
            }
        };

        if keys.is_empty() {
            return true;
        }

        match self.run("DEL", backend.delete(&keys)).await {
            Ok(deleted) => {
                debug!(pattern, deleted, "cache entries invalidated");
                true
            }
            Err(e) => {
                warn!(pattern, "cache delete failed: {e}");
                false
            }
        }
    }

    pub async fn ping(&self) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };
        match self.run("PING", backend.ping()).await {
            Ok(()) => true,
            Err(e) => {
                debug!("cache ping failed: {e}");
                false
            }
        }
    }

    pub async fn diagnostics(&self) -> CacheDiagnostics {
        let Some(backend) = self.backend.as_ref() else {
            return CacheDiagnostics {
                enabled: false,
                connected: false,
                key_count: None,
                used_memory: None,
            };
        };

        let connected = self.ping().await;
        if !connected {
            return CacheDiagnostics {
                enabled: true,
                connected,
                key_count: None,
                used_memory: None,
            };
        }

        let key_count = self.run("DBSIZE", backend.dbsize()).await.ok();
        let used_memory = self
            .run("INFO", backend.info("memory"))
            .await
            .ok()
            .and_then(|info| info_field(&info, "used_memory_human"));

        CacheDiagnostics {
            enabled: true,
            connected,
            key_count,
            used_memory,
        }
    }

    pub async fn shutdown(&self) {
        if let Some(backend) = self.backend.as_ref() {
            backend.shutdown().await;
            info!("Cache store connection released");
        }
    }

    /// Bounds a backend call by the command timeout. On expiry the backend
    /// is told to drop its connection.
    async fn run<T>(
        &self,
        command: &'static str,
        op: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.command_timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                debug!(command, "cache command timed out");
                if let Some(backend) = self.backend.as_ref() {
                    backend.on_timeout().await;
                }
                Err(CacheError::Timeout(self.command_timeout))
            }
        }
    }
}

/// Extracts `name:value` from `INFO` output.
fn info_field(info: &str, name: &str) -> Option<String> {
    info.lines().find_map(|line| {
        line.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|v| v.trim().to_string())
    })
}
