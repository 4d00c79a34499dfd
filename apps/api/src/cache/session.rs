use serde_json::Value;

use super::{keys, CacheStore, Ttl};

/// Per-user session snapshots stored under `session:<userId>`.
#[derive(Clone)]
pub struct SessionCache {
    store: CacheStore,
    ttl: Ttl,
}

impl SessionCache {
    pub fn new(store: CacheStore, ttl: Ttl) -> Self {
        Self { store, ttl }
    }

    pub async fn save(&self, user_id: &str, snapshot: &Value) -> bool {
        self.store
            .set_with_ttl(&keys::session_key(user_id), snapshot, self.ttl)
            .await
    }

    pub async fn load(&self, user_id: &str) -> Option<Value> {
        self.store.get(&keys::session_key(user_id)).await
    }

    pub async fn clear(&self, user_id: &str) -> bool {
        let pattern = keys::escape_glob(&keys::session_key(user_id));
        self.store.delete_by_pattern(&pattern).await
    }
}
