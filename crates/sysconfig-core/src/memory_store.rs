//! In-process store adapter
//!
//! Keeps rows in a map. Useful for tests and for hosts without a database. The
//! store can be switched to "not ready" to emulate a database whose schema has
//! not been set up yet.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::{
	collections::BTreeMap,
	sync::atomic::{AtomicBool, Ordering},
};

use crate::prelude::*;

type Rows = BTreeMap<(Box<str>, Box<str>), Option<Box<str>>>;

#[derive(Debug)]
pub struct MemoryStore {
	rows: RwLock<Rows>,
	ready: AtomicBool,
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryStore {
	pub fn new() -> Self {
		Self { rows: RwLock::new(BTreeMap::new()), ready: AtomicBool::new(true) }
	}

	pub fn set_ready(&self, ready: bool) {
		self.ready.store(ready, Ordering::SeqCst);
	}

	fn check_ready(&self) -> ClResult<()> {
		if self.ready.load(Ordering::SeqCst) {
			Ok(())
		} else {
			Err(Error::ServiceUnavailable("memory store is not ready".into()))
		}
	}

	fn row_key(namespace: &str, key: &str) -> (Box<str>, Box<str>) {
		(namespace.into(), key.into())
	}
}

#[async_trait]
impl StoreAdapter for MemoryStore {
	async fn read_value(&self, namespace: &str, key: &str) -> ClResult<Option<StoredValue>> {
		self.check_ready()?;
		let rows = self.rows.read();
		Ok(rows
			.get(&Self::row_key(namespace, key))
			.map(|value| StoredValue { key: key.into(), value: value.clone() }))
	}

	async fn get_or_create_value(
		&self,
		namespace: &str,
		key: &str,
		default: Option<&str>,
	) -> ClResult<bool> {
		self.check_ready()?;
		let mut rows = self.rows.write();
		let row_key = Self::row_key(namespace, key);
		if rows.contains_key(&row_key) {
			return Ok(false);
		}
		rows.insert(row_key, default.map(Into::into));
		Ok(true)
	}

	async fn upsert_value(&self, namespace: &str, key: &str, value: Option<&str>) -> ClResult<()> {
		self.check_ready()?;
		self.rows.write().insert(Self::row_key(namespace, key), value.map(Into::into));
		Ok(())
	}

	async fn list_values(&self, namespace: &str) -> ClResult<Vec<StoredValue>> {
		self.check_ready()?;
		let rows = self.rows.read();
		Ok(rows
			.iter()
			.filter(|((ns, _), _)| &**ns == namespace)
			.map(|((_, key), value)| StoredValue { key: key.clone(), value: value.clone() })
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_absent_null_and_value_rows() {
		let store = MemoryStore::new();
		assert!(store.read_value("ns", "a/b").await.unwrap().is_none());

		store.upsert_value("ns", "a/b", None).await.unwrap();
		let row = store.read_value("ns", "a/b").await.unwrap().unwrap();
		assert_eq!(row.value, None);

		store.upsert_value("ns", "a/b", Some("x")).await.unwrap();
		let row = store.read_value("ns", "a/b").await.unwrap().unwrap();
		assert_eq!(row.value.as_deref(), Some("x"));
	}

	#[tokio::test]
	async fn test_get_or_create_keeps_existing() {
		let store = MemoryStore::new();
		assert!(store.get_or_create_value("ns", "a/b", Some("1")).await.unwrap());
		assert!(!store.get_or_create_value("ns", "a/b", Some("2")).await.unwrap());
		let row = store.read_value("ns", "a/b").await.unwrap().unwrap();
		assert_eq!(row.value.as_deref(), Some("1"));
	}

	#[tokio::test]
	async fn test_list_is_namespace_scoped() {
		let store = MemoryStore::new();
		store.upsert_value("one", "general/timeout", Some("10")).await.unwrap();
		store.upsert_value("two", "general/timeout", Some("20")).await.unwrap();
		let rows = store.list_values("one").await.unwrap();
		assert_eq!(rows, vec![StoredValue { key: "general/timeout".into(), value: Some("10".into()) }]);
	}

	#[tokio::test]
	async fn test_not_ready() {
		let store = MemoryStore::new();
		store.set_ready(false);
		let err = store.read_value("ns", "a/b").await.unwrap_err();
		assert!(err.is_store_unready());
	}
}

// vim: ts=4
