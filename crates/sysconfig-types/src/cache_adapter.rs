//! Adapter for the process-wide cache backend.
//!
//! Entries have no expiry; they live until invalidated by a write.

use std::fmt::Debug;

use crate::types::ConfigValue;

/// Fixed prefix of every key this subsystem puts into the cache
pub const CACHE_KEY_PREFIX: &str = "config:";

/// Result of a cache lookup.
///
/// A cached value may itself be null, so absence is reported separately.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
	Hit(Option<ConfigValue>),
	Miss,
}

impl CacheLookup {
	pub fn is_hit(&self) -> bool {
		matches!(self, CacheLookup::Hit(_))
	}
}

pub trait CacheAdapter: Debug + Send + Sync {
	fn get(&self, key: &str) -> CacheLookup;

	fn set(&self, key: &str, value: Option<ConfigValue>);

	fn invalidate(&self, key: &str);

	/// Drop every entry
	fn clear(&self);
}

/// Cache key for a canonical public path (`namespace.section.field`)
pub fn cache_key(path: &str) -> String {
	format!("{}{}", CACHE_KEY_PREFIX, path)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cache_key_prefix() {
		assert_eq!(cache_key("todo.general.max_items"), "config:todo.general.max_items");
	}

	#[test]
	fn test_lookup_hit_with_null_is_hit() {
		assert!(CacheLookup::Hit(None).is_hit());
		assert!(!CacheLookup::Miss.is_hit());
	}
}

// vim: ts=4
