//! Marker models for database storage.

use crate::error::Result;
use mapsync_core::MarkerInstance;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored marker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredMarker {
    /// Primary key - store id or coordinate key.
    #[primary_key]
    pub id: String,
    /// Marker type label.
    #[secondary_key]
    pub marker_type: String,
    /// Serialized marker.
    pub payload: Vec<u8>,
}

impl StoredMarker {
    pub fn from_marker(marker: &MarkerInstance) -> Result<Self> {
        Ok(Self {
            id: marker.id.as_str().to_string(),
            marker_type: marker.marker_type.as_str().to_string(),
            payload: bincode::serialize(marker)?,
        })
    }

    pub fn to_marker(&self) -> Result<MarkerInstance> {
        Ok(bincode::deserialize(&self.payload)?)
    }
}
