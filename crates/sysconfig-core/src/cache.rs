//! In-process LRU cache backend
//!
//! Entries never expire; they are dropped by explicit invalidation or when the
//! least recently used entry is evicted to stay within capacity.

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;

use crate::prelude::*;
use sysconfig_types::cache_adapter::{CacheAdapter, CacheLookup};

const FALLBACK_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(99);

#[derive(Debug)]
pub struct LruConfigCache {
	cache: RwLock<LruCache<Box<str>, Option<ConfigValue>>>,
}

impl LruConfigCache {
	/// A capacity of zero falls back to 100 entries
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(FALLBACK_CAPACITY);
		Self { cache: RwLock::new(LruCache::new(capacity)) }
	}

	pub fn len(&self) -> usize {
		self.cache.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl CacheAdapter for LruConfigCache {
	fn get(&self, key: &str) -> CacheLookup {
		// LRU lookups update recency, so even reads need the write lock
		match self.cache.write().get(key) {
			Some(value) => CacheLookup::Hit(value.clone()),
			None => CacheLookup::Miss,
		}
	}

	fn set(&self, key: &str, value: Option<ConfigValue>) {
		self.cache.write().put(key.into(), value);
	}

	fn invalidate(&self, key: &str) {
		self.cache.write().pop(key);
	}

	fn clear(&self) {
		self.cache.write().clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_null_value_is_a_hit() {
		let cache = LruConfigCache::new(10);
		assert_eq!(cache.get("config:a.b.c"), CacheLookup::Miss);
		cache.set("config:a.b.c", None);
		assert_eq!(cache.get("config:a.b.c"), CacheLookup::Hit(None));
	}

	#[test]
	fn test_invalidate_and_clear() {
		let cache = LruConfigCache::new(10);
		cache.set("k1", Some(1.into()));
		cache.set("k2", Some(2.into()));
		cache.invalidate("k1");
		assert_eq!(cache.get("k1"), CacheLookup::Miss);
		assert_eq!(cache.get("k2"), CacheLookup::Hit(Some(2.into())));
		cache.clear();
		assert!(cache.is_empty());
	}

	#[test]
	fn test_capacity_evicts_least_recent() {
		let cache = LruConfigCache::new(2);
		cache.set("a", Some(1.into()));
		cache.set("b", Some(2.into()));
		let _ = cache.get("a");
		cache.set("c", Some(3.into()));
		assert!(cache.get("a").is_hit());
		assert!(!cache.get("b").is_hit());
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn test_zero_capacity_falls_back() {
		let cache = LruConfigCache::new(0);
		cache.set("a", None);
		assert!(cache.get("a").is_hit());
	}
}

// vim: ts=4
