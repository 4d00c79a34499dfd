//! Store doubles for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::{Duration, Instant};

use super::{CacheBackend, CacheError};

/// In-process backend with per-key expiry on the tokio clock and
/// redis-style glob matching for `KEYS`.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw string without expiry, bypassing serialization.
    pub fn insert_raw(&self, key: &str, raw: &str) {
        self.lock().insert(key.to_string(), (raw.to_string(), None));
    }

    /// Number of `set_ex` calls received.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Seconds until `key` expires, if it is live and has a TTL.
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .and_then(|(_, exp)| *exp)
            .filter(|e| *e > now)
            .map(|e| (e - now).as_secs_f64().round() as u64)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.live_keys().iter().any(|k| k == key)
    }

    pub fn live_keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, (_, exp))| exp.map_or(true, |e| e > now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Option<Instant>)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some((_, Some(expires_at))) => *expires_at <= Instant::now(),
            Some((_, None)) => false,
            None => return Ok(None),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(v, _)| v.clone()))
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.lock()
            .insert(key.to_string(), (value, Some(expires_at)));
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .live_keys()
            .into_iter()
            .filter(|k| glob_match(pattern, k))
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let mut entries = self.lock();
        Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count() as u64)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn dbsize(&self) -> Result<u64, CacheError> {
        Ok(self.live_keys().len() as u64)
    }

    async fn info(&self, _section: &str) -> Result<String, CacheError> {
        Ok("# Memory\r\nused_memory:1024\r\nused_memory_human:1.00K\r\n".to_string())
    }
}

/// Backend whose every call fails as if the store were down.
pub struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(down())
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: u64) -> Result<(), CacheError> {
        Err(down())
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        Err(down())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(down())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(down())
    }

    async fn dbsize(&self) -> Result<u64, CacheError> {
        Err(down())
    }

    async fn info(&self, _section: &str) -> Result<String, CacheError> {
        Err(down())
    }
}

/// Backend whose every call never completes.
pub struct HangingBackend;

#[async_trait]
impl CacheBackend for HangingBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        std::future::pending().await
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: u64) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        std::future::pending().await
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        std::future::pending().await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn dbsize(&self) -> Result<u64, CacheError> {
        std::future::pending().await
    }

    async fn info(&self, _section: &str) -> Result<String, CacheError> {
        std::future::pending().await
    }
}

fn down() -> CacheError {
    CacheError::Unavailable("connection refused".to_string())
}

/// Redis `KEYS` glob subset: `*`, `?` and backslash escapes.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    matches_from(&p, &t)
}

fn matches_from(p: &[char], t: &[char]) -> bool {
    match p.first() {
        None => t.is_empty(),
        Some('*') => (0..=t.len()).any(|i| matches_from(&p[1..], &t[i..])),
        Some('?') => !t.is_empty() && matches_from(&p[1..], &t[1..]),
        Some('\\') if p.len() > 1 => {
            t.first() == Some(&p[1]) && matches_from(&p[2..], &t[1..])
        }
        Some(c) => t.first() == Some(c) && matches_from(&p[1..], &t[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_prefix_star() {
        assert!(glob_match("api:/support*", "api:/support/tickets:abc"));
        assert!(!glob_match("api:/support*", "api:/cv-intelligence/batches:abc"));
    }

    #[test]
    fn test_glob_match_escaped_metachar() {
        assert!(glob_match(r"api:/odd\*path*", "api:/odd*path:1"));
        assert!(!glob_match(r"api:/odd\*path*", "api:/oddXpath:1"));
    }

    #[test]
    fn test_glob_match_question_mark() {
        assert!(glob_match("session:?", "session:7"));
        assert!(!glob_match("session:?", "session:77"));
    }
}
