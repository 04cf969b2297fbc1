//! Translation cache interface.
//!
//! Cached values are encoded [`crate::i18n::TaggedString`]s addressed by a
//! hash of the source text they were translated from. The store itself is
//! byte-oriented; the translator owns encoding.

use crate::i18n::EncodingError;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::Mutex;

/// Prefix shared by every translation cache key.
pub const KEY_PREFIX: &str = "language-";

/// Cache key for a source text: `language-` + hex SHA-1 of its UTF-8 bytes.
pub fn cache_key(source_text: &str) -> String {
    let digest = Sha1::digest(source_text.as_bytes());
    format!("{}{}", KEY_PREFIX, hex::encode(digest))
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend failure: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("cache lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Callback run inside an update transaction: receives the stored value (if
/// any) and returns the value to store.
pub type UpdateFn<'a> = dyn FnMut(Option<&[u8]>) -> Result<Vec<u8>, EncodingError> + 'a;

/// Byte-oriented key/value store with transactional updates.
pub trait CacheStore: Send + Sync {
    /// Read a value in a read-only scope.
    fn view(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Read the current value and write the replacement atomically.
    ///
    /// Nothing is written when `apply` fails.
    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<(), CacheError>;
}

/// In-process cache for tests and for embedding without persistence.
#[derive(Debug, Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn view(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let values = self.values.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<(), CacheError> {
        let mut values = self.values.lock().map_err(|_| CacheError::Poisoned)?;
        let next = apply(values.get(key).map(Vec::as_slice))?;
        values.insert(key.to_string(), next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        let key = cache_key("animal");
        assert!(key.starts_with(KEY_PREFIX));
        assert_eq!(key.len(), KEY_PREFIX.len() + 40);
        assert!(key[KEY_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_cache_key_known_digest() {
        // SHA-1 of the empty string
        assert_eq!(
            cache_key(""),
            "language-da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        // SHA-1("abc")
        assert_eq!(
            cache_key("abc"),
            "language-a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_cache_key_distinguishes_texts() {
        assert_ne!(cache_key("animal"), cache_key("Animal"));
        assert_eq!(cache_key("bête"), cache_key("bête"));
    }

    #[test]
    fn test_memory_cache_view_missing() {
        let cache = MemoryCache::new();
        assert!(cache.view("nope").unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_memory_cache_update_sees_current_value() {
        let cache = MemoryCache::new();
        cache
            .update("k", &mut |current| {
                assert!(current.is_none());
                Ok(b"one".to_vec())
            })
            .unwrap();
        cache
            .update("k", &mut |current| {
                assert_eq!(current, Some(&b"one"[..]));
                Ok(b"two".to_vec())
            })
            .unwrap();

        assert_eq!(cache.view("k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_memory_cache_failed_update_writes_nothing() {
        let cache = MemoryCache::new();
        let result = cache.update("k", &mut |_| {
            Err(crate::i18n::TaggedString::from_json("42").unwrap_err())
        });
        assert!(matches!(result, Err(CacheError::Encoding(_))));
        assert!(cache.view("k").unwrap().is_none());
    }
}
