use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, FromRedisValue, RedisError};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{CacheBackend, CacheError};

/// Redis-backed store with a lazily (re)established multiplexed connection.
///
/// The connection slot is `None` until first use and is reset to `None` on
/// any command error or timeout, so the next call reconnects instead of reusing a
/// broken handle. The multiplexed connection is shared by all concurrent
/// callers; the mutex only guards the slot, never a command in flight.
pub struct RedisBackend {
    client: Client,
    connect_timeout: Duration,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisBackend {
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, CacheError> {
        Ok(Self {
            client: Client::open(url)?,
            connect_timeout,
            conn: Mutex::new(None),
        })
    }

    /// Returns the live connection, connecting and pinging it if needed.
    /// Idempotent: an existing connection is returned as-is.
    ///
    /// Connect and the liveness PING share one `connect_timeout`, so a stalled
    /// handshake never holds the slot longer than that.
    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = tokio::time::timeout(self.connect_timeout, self.open())
            .await
            .map_err(|_| CacheError::Timeout(self.connect_timeout))??;
        info!("Redis connection established");

        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn open(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(conn)
    }

    async fn mark_disconnected(&self, err: &RedisError) {
        warn!("Redis transport error, dropping connection: {err}");
        *self.conn.lock().await = None;
    }

    async fn query<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, CacheError> {
        let mut conn = self.connection().await?;
        match cmd.query_async::<_, T>(&mut conn).await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.mark_disconnected(&e).await;
                Err(CacheError::Redis(e))
            }
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.query(redis::cmd("GET").arg(key)).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        self.query(redis::cmd("SET").arg(key).arg(value).arg("EX").arg(ttl_secs))
            .await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.query(redis::cmd("KEYS").arg(pattern)).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.query(redis::cmd("DEL").arg(keys)).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let _: String = self.query(&redis::cmd("PING")).await?;
        Ok(())
    }

    async fn dbsize(&self) -> Result<u64, CacheError> {
        self.query(&redis::cmd("DBSIZE")).await
    }

    async fn info(&self, section: &str) -> Result<String, CacheError> {
        self.query(redis::cmd("INFO").arg(section)).await
    }

    async fn on_timeout(&self) {
        warn!("Redis command timed out, dropping connection");
        *self.conn.lock().await = None;
    }

    async fn shutdown(&self) {
        *self.conn.lock().await = None;
    }
}
