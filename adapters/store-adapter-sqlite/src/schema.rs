//! Database schema

use sqlx::SqlitePool;

pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Config values //
	///////////////////
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS config_values (
			namespace text NOT NULL,
			path text NOT NULL,
			value text,
			PRIMARY KEY(namespace, path)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
