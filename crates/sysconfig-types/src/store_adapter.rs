//! Adapter that persists raw configuration values.
//!
//! The store is a plain key-value relation keyed by `(namespace, key)`, where key
//! is an opaque `section/field` string. A row may hold `None`, which is distinct
//! from the row being absent.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// One persisted row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
	pub key: Box<str>,
	pub value: Option<Box<str>>,
}

#[async_trait]
pub trait StoreAdapter: Debug + Send + Sync {
	/// Read a single row. Returns `None` if no row exists.
	async fn read_value(&self, namespace: &str, key: &str) -> ClResult<Option<StoredValue>>;

	/// Insert a row with `default` unless one already exists.
	///
	/// Returns `true` if a row was created.
	async fn get_or_create_value(
		&self,
		namespace: &str,
		key: &str,
		default: Option<&str>,
	) -> ClResult<bool>;

	/// Insert or replace a row
	async fn upsert_value(&self, namespace: &str, key: &str, value: Option<&str>) -> ClResult<()>;

	/// List every row stored under a namespace
	async fn list_values(&self, namespace: &str) -> ClResult<Vec<StoredValue>>;
}

// vim: ts=4
