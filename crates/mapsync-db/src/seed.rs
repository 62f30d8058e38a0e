//! RON seed data
//!
//! A seed lists definitions with their ids and marker drafts:
//!
//! ```ron
//! (
//!     definitions: [
//!         (id: "sword", details: (name: "Sword"), traits: Item(rarity: Rare)),
//!     ],
//!     markers: [
//!         (marker_type: Item, coords: (12.5, 40.25), definition_ref: Some("sword")),
//!     ],
//! )
//! ```

use crate::error::Result;
use crate::models::*;
use crate::store::Store;
use mapsync_core::{Definition, DefinitionKind, MarkerDraft, MarkerInstance};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Contents of a seed file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub markers: Vec<MarkerDraft>,
}

/// What a seed wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub definitions: usize,
    pub markers: usize,
    /// Markers whose definition reference matches nothing
    pub dangling: usize,
}

impl Seed {
    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }
}

impl Store {
    /// Write a seed in one transaction, then republish every stream.
    ///
    /// Existing records with the same keys are overwritten. Markers at the
    /// same coordinates collapse onto one record, the last one winning.
    pub fn seed(&self, seed: Seed) -> Result<SeedReport> {
        let mut report = SeedReport::default();
        let rw = self.db.rw_transaction()?;
        for definition in &seed.definitions {
            rw.upsert(StoredDefinition::from_definition(definition)?)?;
            report.definitions += 1;
        }
        for draft in &seed.markers {
            draft.coords.validate()?;
            let marker = MarkerInstance::from_draft(draft.clone());
            // Definitions written above are visible inside this transaction
            if let Some((kind, id)) = marker.definition_key() {
                let stored: Option<StoredDefinition> =
                    rw.get().primary(StoredDefinition::key_of(kind, id))?;
                if stored.is_none() {
                    warn!(marker = %marker.id, %kind, definition = %id, "seed marker references unknown definition");
                    report.dangling += 1;
                }
            }
            rw.upsert(StoredMarker::from_marker(&marker)?)?;
            report.markers += 1;
        }
        rw.commit()?;

        info!(
            definitions = report.definitions,
            markers = report.markers,
            dangling = report.dangling,
            "seed loaded"
        );
        for kind in DefinitionKind::ALL {
            self.publish_definitions(kind);
        }
        self.publish_markers();
        Ok(report)
    }

    /// Parse and write a RON seed.
    pub fn seed_from_str(&self, content: &str) -> Result<SeedReport> {
        self.seed(Seed::from_ron_str(content)?)
    }

    /// Read, parse and write a RON seed file.
    pub fn seed_from_file(&self, path: impl AsRef<Path>) -> Result<SeedReport> {
        self.seed(Seed::load(path)?)
    }
}
