//! Definition models for database storage.

use crate::error::Result;
use mapsync_core::{DefId, Definition, DefinitionKind};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored definition, one row per (kind, id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredDefinition {
    /// Primary key - "{kind}/{id}".
    #[primary_key]
    pub key: String,
    /// Definition kind, for per-collection scans.
    #[secondary_key]
    pub kind: String,
    /// Serialized definition.
    pub payload: Vec<u8>,
}

impl StoredDefinition {
    /// Primary key of a definition.
    pub fn key_of(kind: DefinitionKind, id: &DefId) -> String {
        format!("{}/{}", kind, id)
    }

    pub fn from_definition(definition: &Definition) -> Result<Self> {
        Ok(Self {
            key: Self::key_of(definition.kind(), &definition.id),
            kind: definition.kind().as_str().to_string(),
            payload: bincode::serialize(definition)?,
        })
    }

    pub fn to_definition(&self) -> Result<Definition> {
        Ok(bincode::deserialize(&self.payload)?)
    }
}

/// Per-kind counter for store-assigned definition ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredCounter {
    #[primary_key]
    pub name: String,
    pub value: u64,
}

impl StoredCounter {
    pub fn name_for(kind: DefinitionKind) -> String {
        format!("definition/{}", kind)
    }
}
