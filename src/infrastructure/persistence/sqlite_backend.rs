//! SQLite shard-file backend implementation.
//!
//! Each shard is a single SQLite file. The shard number lives in the file's
//! `PRAGMA user_version`, so a file is self-describing: readers recover the
//! number without configuration, and a writable open cross-checks it against
//! the requested one.

use crate::domain::entities::UrlEntry;
use crate::domain::repositories::Backend;
use crate::error::AppError;
use crate::utils::snowflake::MAX_NODE;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS url (
    id INTEGER NOT NULL PRIMARY KEY,
    url TEXT NOT NULL,
    expire_at INTEGER
)";

const TMP_SCHEMA: &str = "CREATE TABLE url_tmp (
    id INTEGER NOT NULL PRIMARY KEY,
    url TEXT NOT NULL,
    expire_at INTEGER
)";

/// SQLite-backed storage shard.
pub struct SqliteBackend {
    pool: SqlitePool,
    shard: u64,
}

impl SqliteBackend {
    /// Opens an existing shard file read-only.
    ///
    /// The shard number is read from `PRAGMA user_version`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the file is missing or unreadable.
    pub async fn open_read(path: &Path) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let shard = stored_shard(&pool).await?;
        Ok(Self { pool, shard })
    }

    /// Opens (creating if missing) a shard file for writing as shard `shard`.
    ///
    /// A freshly created file gets the schema and has `shard` persisted into
    /// `PRAGMA user_version`. An existing file must already carry the same
    /// shard number.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `shard` is out of range or does not
    /// match the number stored in an existing file, [`AppError::Storage`] on
    /// database failures.
    pub async fn open_writable(path: &Path, shard: u64) -> Result<Self, AppError> {
        if shard > MAX_NODE {
            return Err(AppError::Config(format!(
                "shard number {shard} out of range 0-{MAX_NODE}"
            )));
        }

        let fresh = !path.exists();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        if fresh {
            // PRAGMA cannot take a bind parameter; shard is range-checked above.
            sqlx::query(&format!("PRAGMA user_version = {shard}"))
                .execute(&pool)
                .await?;
            sqlx::query(SCHEMA).execute(&pool).await?;
            info!("initialized shard {shard} at {}", path.display());
        }

        let stored = stored_shard(&pool).await?;
        if stored != shard {
            return Err(AppError::Config(format!(
                "shard number mismatch for {}: expected {shard}, file carries {stored}",
                path.display()
            )));
        }

        Ok(Self { pool, shard })
    }

    /// Total stored rows, expired ones included. Test and tooling helper.
    pub async fn count(&self) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM url")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? as u64)
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<UrlEntry, sqlx::Error> {
    Ok(UrlEntry {
        id: row.try_get::<i64, _>("id")? as u64,
        url: row.try_get("url")?,
        expire_at: row.try_get("expire_at")?,
    })
}

async fn stored_shard(pool: &SqlitePool) -> Result<u64, AppError> {
    let row = sqlx::query("PRAGMA user_version").fetch_one(pool).await?;
    let version: i64 = row.try_get(0)?;
    Ok(version as u64 & MAX_NODE)
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn insert(&self, entry: UrlEntry) -> Result<(), AppError> {
        sqlx::query("INSERT INTO url (id, url, expire_at) VALUES (?, ?, ?)")
            .bind(entry.id as i64)
            .bind(&entry.url)
            .bind(entry.expire_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_by_url(&self, url: &str, now: i64) -> Result<Vec<UrlEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, url, expire_at FROM url
             WHERE url = ? AND (expire_at IS NULL OR expire_at > ?)
             ORDER BY id",
        )
        .bind(url)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| entry_from_row(row).map_err(AppError::from))
            .collect()
    }

    async fn query_by_id(&self, id: u64, now: i64) -> Result<Option<UrlEntry>, AppError> {
        let row = sqlx::query(
            "SELECT id, url, expire_at FROM url
             WHERE id = ? AND (expire_at IS NULL OR expire_at > ?)",
        )
        .bind(id as i64)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(|r| entry_from_row(r).map_err(AppError::from))
            .transpose()
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM url WHERE id = ?")
            .bind(id as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_expired(&self, now: i64) -> Result<u64, AppError> {
        // Build a replacement table holding only the surviving rows, then
        // swap it in; readers either see the old table or the new one.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DROP TABLE IF EXISTS url_tmp")
            .execute(&mut *tx)
            .await?;
        sqlx::query(TMP_SCHEMA).execute(&mut *tx).await?;

        let removed_row = sqlx::query(
            "SELECT COUNT(*) AS n FROM url WHERE expire_at IS NOT NULL AND expire_at <= ?",
        )
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        let removed = removed_row.try_get::<i64, _>("n")? as u64;

        sqlx::query(
            "INSERT INTO url_tmp (id, url, expire_at)
             SELECT id, url, expire_at FROM url
             WHERE expire_at IS NULL OR expire_at > ?",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DROP TABLE url").execute(&mut *tx).await?;
        sqlx::query("ALTER TABLE url_tmp RENAME TO url")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }

    fn shard_number(&self) -> u64 {
        self.shard
    }
}
