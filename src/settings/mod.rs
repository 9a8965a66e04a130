//! Per-identity settings storage.
//!
//! The roster never owns settings; it only knows the [`IdentityKey`] each
//! record resolves to. Storage engines sit behind [`SettingsStore`], which
//! exposes "find the document for this key" and "write one field".

use crate::identity::IdentityKey;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::MemorySettings;
pub use sqlite::SqliteSettings;

/// A user's settings: field name to JSON value.
pub type SettingsDocument = Map<String, Value>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the whole settings document for `identity`, if one exists.
    async fn find_settings(
        &self,
        identity: &IdentityKey,
    ) -> Result<Option<SettingsDocument>, SettingsError>;

    /// Create or overwrite a single field of `identity`'s document.
    async fn store_setting(
        &self,
        identity: &IdentityKey,
        name: &str,
        value: Value,
    ) -> Result<(), SettingsError>;
}
