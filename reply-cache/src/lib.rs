//! In-process response cache.
//!
//! Two key families share one cache:
//! - `learning_path:<title>` memoizes learning-path content by title.
//! - `llm_response:<sha256>` memoizes normalized model replies by a content
//!   hash of `(learning_path, user_input, conversation_text)`, so identical
//!   repeated turns from the same conversation state skip the upstream call.
//!
//! Values are idempotent derivations of their key, so concurrent requests
//! racing on the same key may redundantly recompute or overwrite.

use std::time::Duration;

use moka::future::Cache;
use sha2::{Digest, Sha256};
use tracing::debug;

/// String key/value cache with bounded capacity and an optional TTL.
///
/// Cheap to clone; all clones share the same backing cache.
#[derive(Clone)]
pub struct ReplyCache {
    inner: Cache<String, String>,
}

impl ReplyCache {
    /// Creates a cache holding up to `capacity` entries. When `ttl` is
    /// `None`, entries live until evicted or overwritten.
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }

    /// Looks up a value by key.
    pub async fn get(&self, key: &str) -> Option<String> {
        let hit = self.inner.get(key).await;
        debug!(%key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Stores a value under `key`, overwriting any previous entry.
    pub async fn insert(&self, key: String, value: String) {
        self.inner.insert(key, value).await;
    }
}

/// Cache key for learning-path content, keyed by the unique title.
pub fn learning_path_key(title: &str) -> String {
    format!("learning_path:{title}")
}

/// Cache key for a normalized model reply.
///
/// The hash covers the learning path, the user input and the concatenated
/// text of every prior conversation turn, in that order.
pub fn model_reply_key(learning_path: &str, user_input: &str, conversation_text: &str) -> String {
    let digest = sha_hex(&format!("{learning_path}:{user_input}:{conversation_text}"));
    format!("llm_response:{digest}")
}

fn sha_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let out = hasher.finalize();
    let mut hex = String::with_capacity(out.len() * 2);
    for b in out {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{b:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_get() {
        let cache = ReplyCache::new(16, None);
        cache.insert("k".into(), "v".into()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn insert_overwrites() {
        let cache = ReplyCache::new(16, None);
        cache.insert("k".into(), "v1".into()).await;
        cache.insert("k".into(), "v2".into()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v2"));
    }

    #[test]
    fn reply_key_is_stable_and_sensitive() {
        let a = model_reply_key("Whatsapp", "hi", "earlier text");
        let b = model_reply_key("Whatsapp", "hi", "earlier text");
        let c = model_reply_key("Whatsapp", "hi", "different text");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("llm_response:"));
        // sha256 hex digest
        assert_eq!(a.len(), "llm_response:".len() + 64);
    }

    #[test]
    fn learning_path_key_format() {
        assert_eq!(learning_path_key("Whatsapp"), "learning_path:Whatsapp");
    }
}
