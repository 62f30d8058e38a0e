//! Common query patterns for the store.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use mapsync_core::{DefId, DefinitionKind, MarkerInstance, MarkerType};

impl Store {
    /// Get all markers of one type.
    pub fn markers_of_type(&self, marker_type: MarkerType) -> Result<Vec<MarkerInstance>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredMarker>(StoredMarkerKey::marker_type)?;
        let iter = scan.start_with(marker_type.as_str())?;
        let stored: std::result::Result<Vec<StoredMarker>, _> = iter.collect();
        let stored = stored.map_err(|e| Error::Database(e.to_string()))?;
        stored.iter().map(StoredMarker::to_marker).collect()
    }

    /// Count markers of one type.
    pub fn count_markers_of_type(&self, marker_type: MarkerType) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredMarker>(StoredMarkerKey::marker_type)?;
        let iter = scan.start_with(marker_type.as_str())?;
        Ok(iter.count())
    }

    /// Get the markers referencing one definition.
    pub fn markers_referencing(&self, kind: DefinitionKind, id: &DefId) -> Result<Vec<MarkerInstance>> {
        Ok(self
            .markers_of_type(kind.marker_type())?
            .into_iter()
            .filter(|m| m.definition_ref.as_ref() == Some(id))
            .collect())
    }

    /// Count definitions of one kind.
    pub fn count_definitions(&self, kind: DefinitionKind) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredDefinition>(StoredDefinitionKey::kind)?;
        let iter = scan.start_with(kind.as_str())?;
        Ok(iter.count())
    }
}
