//! Injectable response cache port. The default is a no-op; tests and batch
//! tooling can plug in [`MemoryCache`] to avoid repeated identical calls.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::AiRequest;

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: String);
}

/// Default cache: stores nothing, returns nothing.
pub struct NoopCache;

#[async_trait]
impl ResponseCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn put(&self, _key: &str, _value: String) {}
}

/// Process-local cache keyed by request hash.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    async fn put(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }
}

/// Cache key for a text-only request: model + prompts + mode.
pub(crate) fn request_key(model: &str, request: &AiRequest) -> String {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    request.system_prompt.hash(&mut hasher);
    request.user_prompt.hash(&mut hasher);
    request.json_mode.hash(&mut hasher);
    request.max_tokens.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_cache_never_hits() {
        let cache = NoopCache;
        cache.put("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        cache.put("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_requests_get_distinct_keys() {
        let a = AiRequest::new("sys", "one");
        let b = AiRequest::new("sys", "two");
        assert_ne!(request_key("m", &a), request_key("m", &b));
        assert_eq!(request_key("m", &a), request_key("m", &a));
    }
}
