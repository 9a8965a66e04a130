//! In-process settings store.
//!
//! Used when no database is configured. Nothing survives a restart.

use super::{SettingsDocument, SettingsError, SettingsStore};
use crate::identity::IdentityKey;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemorySettings {
    documents: RwLock<HashMap<IdentityKey, SettingsDocument>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a complete document, replacing any existing one.
    pub fn insert_document(&self, identity: IdentityKey, document: SettingsDocument) {
        self.documents.write().insert(identity, document);
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn find_settings(
        &self,
        identity: &IdentityKey,
    ) -> Result<Option<SettingsDocument>, SettingsError> {
        Ok(self.documents.read().get(identity).cloned())
    }

    async fn store_setting(
        &self,
        identity: &IdentityKey,
        name: &str,
        value: Value,
    ) -> Result<(), SettingsError> {
        self.documents
            .write()
            .entry(identity.clone())
            .or_default()
            .insert(name.to_owned(), value);
        Ok(())
    }
}
