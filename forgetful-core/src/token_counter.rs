//! Token counting for context-budget management (spec §4.G).
//!
//! Mirrors the source prototype's `tiktoken` usage (`cl100k_base`, the
//! encoding `tiktoken` falls back to for any `gpt-4`-family model) with a
//! content-hash cache layered on top, the way the pack's `cortex-tokens`
//! crate pairs `tiktoken-rs` with `blake3` + `moka`.

use moka::sync::Cache;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Counts tokens for a string using the `cl100k_base` encoding, caching
/// results by content hash so repeated composer passes over the same
/// memory text don't re-tokenize it.
pub struct TokenCounter {
    encoding: Arc<CoreBPE>,
    cache: Cache<[u8; 32], usize>,
}

impl TokenCounter {
    /// Build a counter with a cache capped at `cache_capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if the `cl100k_base` encoding table fails to load, which
    /// would indicate a corrupted `tiktoken-rs` install rather than a
    /// recoverable runtime condition.
    #[must_use]
    pub fn with_cache_capacity(cache_capacity: u64) -> Self {
        let encoding = tiktoken_rs::cl100k_base().expect("cl100k_base encoding must be available");
        Self {
            encoding: Arc::new(encoding),
            cache: Cache::new(cache_capacity),
        }
    }

    /// Count tokens without consulting the cache.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.encoding.encode_ordinary(text).len()
    }

    /// Count tokens, reusing a cached result for identical content.
    #[must_use]
    pub fn count_cached(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let hash = *blake3::hash(text.as_bytes()).as_bytes();
        if let Some(count) = self.cache.get(&hash) {
            return count;
        }
        let count = self.count(text);
        self.cache.insert(hash, count);
        count
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::with_cache_capacity(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_counts_zero() {
        let counter = TokenCounter::default();
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn cached_matches_uncached() {
        let counter = TokenCounter::default();
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(counter.count(text), counter.count_cached(text));
    }

    #[test]
    fn cache_hit_returns_same_value_on_repeat() {
        let counter = TokenCounter::default();
        let text = "repeated content for cache test";
        let first = counter.count_cached(text);
        let second = counter.count_cached(text);
        assert_eq!(first, second);
    }

    #[test]
    fn longer_text_has_more_or_equal_tokens() {
        let counter = TokenCounter::default();
        let short = counter.count("hello");
        let long = counter.count("hello there, this is a much longer sentence");
        assert!(long >= short);
    }
}
