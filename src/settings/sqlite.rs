//! SQLite-backed settings store.
//!
//! Each field is one row keyed by `(identity, name)`, with the value kept as
//! JSON text so documents can hold any shape the plugins want.

use super::{SettingsDocument, SettingsError, SettingsStore};
use crate::identity::IdentityKey;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Settings store with a connection pool.
#[derive(Clone)]
pub struct SqliteSettings {
    pool: SqlitePool,
}

impl SqliteSettings {
    /// Connection acquire timeout.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open (or create) the database at `path`, running migrations if needed.
    ///
    /// `:memory:` gives each call its own private in-memory database.
    pub async fn open(path: &str) -> Result<Self, SettingsError> {
        let pool = if path == ":memory:" {
            // sqlx names each `sqlite::memory:` database uniquely and shares it across the pool.
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

            // The database lives only as long as its last connection.
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(options)
                .await?;

            sqlx::query("PRAGMA journal_mode=WAL")
                .execute(&pool)
                .await?;
            sqlx::query("PRAGMA synchronous=NORMAL")
                .execute(&pool)
                .await?;
            pool
        };

        info!(path = %path, "Settings database connected");

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SettingsStore for SqliteSettings {
    async fn find_settings(
        &self,
        identity: &IdentityKey,
    ) -> Result<Option<SettingsDocument>, SettingsError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT name, value FROM user_settings
            WHERE identity = ?
            "#,
        )
        .bind(identity.as_str())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut document = SettingsDocument::new();
        for (name, raw) in rows {
            document.insert(name, serde_json::from_str(&raw)?);
        }
        Ok(Some(document))
    }

    async fn store_setting(
        &self,
        identity: &IdentityKey,
        name: &str,
        value: Value,
    ) -> Result<(), SettingsError> {
        let raw = serde_json::to_string(&value)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO user_settings (identity, name, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (identity, name)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(identity.as_str())
        .bind(name)
        .bind(raw)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
