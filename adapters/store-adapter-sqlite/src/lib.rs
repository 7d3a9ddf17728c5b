//! SQLite store adapter
//!
//! Persists raw configuration values in a single `config_values` table keyed by
//! `(namespace, path)`.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod schema;

use async_trait::async_trait;
use sqlx::{
	Row,
	sqlite::{self, SqlitePool},
};
use std::path::Path;

use sysconfig_types::prelude::*;
use sysconfig_types::store_adapter::{StoreAdapter, StoredValue};

/// Map a sqlx error, reporting a missing schema as an unready store
fn map_db_err(err: sqlx::Error) -> Error {
	if let sqlx::Error::Database(db_err) = &err {
		if db_err.message().contains("no such table") {
			debug!("DB: schema missing: {}", db_err.message());
			return Error::ServiceUnavailable("config_values table does not exist".into());
		}
	}
	warn!("DB: {:#?}", err);
	Error::DbError
}

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
}

impl StoreAdapterSqlite {
	/// Open (creating if missing) the database and set up the schema
	pub async fn new(path: impl AsRef<Path>) -> ClResult<Self> {
		let adapter = Self::connect(path).await?;
		adapter.init_schema().await?;
		Ok(adapter)
	}

	/// Open (creating if missing) the database without touching the schema
	pub async fn connect(path: impl AsRef<Path>) -> ClResult<Self> {
		if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await.map_err(|err| {
				Error::ConfigError(format!("cannot create {}: {}", parent.display(), err))
			})?;
		}

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}

	pub async fn init_schema(&self) -> ClResult<()> {
		schema::init_db(&self.db)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.or(Err(Error::DbError))
	}
}

#[async_trait]
impl StoreAdapter for StoreAdapterSqlite {
	async fn read_value(&self, namespace: &str, key: &str) -> ClResult<Option<StoredValue>> {
		let row = sqlx::query("SELECT value FROM config_values WHERE namespace = ? AND path = ?")
			.bind(namespace)
			.bind(key)
			.fetch_optional(&self.db)
			.await
			.map_err(map_db_err)?;

		row.map(|row| -> ClResult<StoredValue> {
			let value: Option<String> = row.try_get("value").map_err(map_db_err)?;
			Ok(StoredValue { key: key.into(), value: value.map(Into::into) })
		})
		.transpose()
	}

	async fn get_or_create_value(
		&self,
		namespace: &str,
		key: &str,
		default: Option<&str>,
	) -> ClResult<bool> {
		let res = sqlx::query(
			"INSERT OR IGNORE INTO config_values (namespace, path, value) VALUES (?, ?, ?)",
		)
		.bind(namespace)
		.bind(key)
		.bind(default)
		.execute(&self.db)
		.await
		.map_err(map_db_err)?;

		Ok(res.rows_affected() > 0)
	}

	async fn upsert_value(&self, namespace: &str, key: &str, value: Option<&str>) -> ClResult<()> {
		sqlx::query(
			"INSERT INTO config_values (namespace, path, value) VALUES (?, ?, ?)
			ON CONFLICT(namespace, path) DO UPDATE SET value = excluded.value",
		)
		.bind(namespace)
		.bind(key)
		.bind(value)
		.execute(&self.db)
		.await
		.map_err(map_db_err)?;

		Ok(())
	}

	async fn list_values(&self, namespace: &str) -> ClResult<Vec<StoredValue>> {
		let rows = sqlx::query("SELECT path, value FROM config_values WHERE namespace = ? ORDER BY path")
			.bind(namespace)
			.fetch_all(&self.db)
			.await
			.map_err(map_db_err)?;

		rows.into_iter()
			.map(|row| -> ClResult<StoredValue> {
				let key: String = row.try_get("path").map_err(map_db_err)?;
				let value: Option<String> = row.try_get("value").map_err(map_db_err)?;
				Ok(StoredValue { key: key.into(), value: value.map(Into::into) })
			})
			.collect()
	}
}

// vim: ts=4
