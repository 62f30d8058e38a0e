//! Marker instances placed on the map

use crate::{
    Coords, DefId, Details, Error, ExtraLine, MarkerId, MarkerType, Result, Traits, Value,
    ValueMap,
};
use serde::{Deserialize, Serialize};

/// A located occurrence on the map, optionally bound to a definition
///
/// When `definition_ref` is set the display fields are derived: the copies
/// kept here only serve offline legibility and are overwritten from the live
/// definition at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerInstance {
    /// Store id or coordinate key
    pub id: MarkerId,
    /// Marker type, decides the render schema
    pub marker_type: MarkerType,
    /// Position on the map
    pub coords: Coords,
    /// Foreign key into the definition collection of `marker_type`
    #[serde(default)]
    pub definition_ref: Option<DefId>,
    /// Display fields (inline or last-known definition copy)
    #[serde(default)]
    pub details: Details,
    /// Kind-specific fields copied from the definition
    #[serde(default)]
    pub traits: Option<Traits>,
    /// Copied from the definition; inline markers are always listed
    #[serde(default = "default_listed")]
    pub show_in_filters: bool,
    /// Free-form extra fields
    #[serde(default)]
    pub properties: ValueMap,
}

fn default_listed() -> bool {
    true
}

/// A marker about to be placed; the id comes from its coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDraft {
    pub marker_type: MarkerType,
    pub coords: Coords,
    #[serde(default)]
    pub definition_ref: Option<DefId>,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub properties: ValueMap,
}

impl MarkerDraft {
    pub fn new(marker_type: MarkerType, coords: Coords) -> Self {
        Self {
            marker_type,
            coords,
            definition_ref: None,
            details: Details::default(),
            properties: ValueMap::new(),
        }
    }

    /// Bind the draft to a definition
    pub fn with_definition(mut self, id: impl Into<DefId>) -> Self {
        self.definition_ref = Some(id.into());
        self
    }

    /// Set the inline display fields
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Field-by-field copy of an existing marker, used for copy/paste
    ///
    /// Definition-derived trait copies are left behind; the pasted marker is
    /// re-enriched from the live definition like any other.
    pub fn from_instance(marker: &MarkerInstance) -> Self {
        Self {
            marker_type: marker.marker_type,
            coords: marker.coords,
            definition_ref: marker.definition_ref.clone(),
            details: Details {
                name: marker.details.name.clone(),
                description: marker.details.description.clone(),
                extra_lines: marker.details.extra_lines.clone(),
                image_small: marker.details.image_small.clone(),
                image_large: marker.details.image_large.clone(),
            },
            properties: marker.properties.clone(),
        }
    }

    /// Move the draft to another position
    pub fn at(mut self, coords: Coords) -> Self {
        self.coords = coords;
        self
    }
}

impl MarkerInstance {
    /// Create an inline marker with the given name
    pub fn new(
        id: impl Into<MarkerId>,
        marker_type: MarkerType,
        coords: Coords,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            marker_type,
            coords,
            definition_ref: None,
            details: Details::named(name),
            traits: None,
            show_in_filters: true,
            properties: ValueMap::new(),
        }
    }

    /// Materialize a draft under the coordinate-derived id
    pub fn from_draft(draft: MarkerDraft) -> Self {
        Self {
            id: draft.coords.marker_id(),
            marker_type: draft.marker_type,
            coords: draft.coords,
            definition_ref: draft.definition_ref,
            details: draft.details,
            traits: None,
            show_in_filters: true,
            properties: draft.properties,
        }
    }

    /// Bind this marker to a definition
    pub fn with_definition(mut self, id: impl Into<DefId>) -> Self {
        self.definition_ref = Some(id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    /// The definition this marker references, only when its type has one
    pub fn definition_key(&self) -> Option<(crate::DefinitionKind, &DefId)> {
        let kind = self.marker_type.definition_kind()?;
        self.definition_ref.as_ref().map(|id| (kind, id))
    }

    /// Apply a partial-field update keyed by document field names
    ///
    /// Recognized fields are `type`, `coords`, `name`, `description`,
    /// `imageSmall`, `imageLarge`, `extraLines` and the foreign-key field of
    /// the (possibly new) marker type. A null value removes a free-form field.
    /// Anything else is stored in `properties`. The patch is validated in full
    /// before any field is written.
    pub fn apply_patch(&mut self, patch: &ValueMap) -> Result<()> {
        let mut next = self.clone();

        if let Some(value) = patch.get("type") {
            let text = value
                .as_str()
                .ok_or_else(|| Error::invalid_patch("type", "expected a string"))?;
            next.marker_type = text
                .parse()
                .map_err(|_| Error::invalid_patch("type", format!("unknown marker type `{text}`")))?;
        }
        let fk_field = next.marker_type.foreign_key_field();
        let type_changed = next.marker_type != self.marker_type;

        for (field, value) in patch {
            match field.as_str() {
                "type" => {}
                "coords" => next.coords = patch_coords(value)?,
                "name" => next.details.name = patch_text(field, value)?.unwrap_or_default(),
                "description" => {
                    next.details.description = patch_text(field, value)?.unwrap_or_default()
                }
                "imageSmall" => next.details.image_small = patch_text(field, value)?,
                "imageLarge" => next.details.image_large = patch_text(field, value)?,
                "extraLines" => next.details.extra_lines = patch_extra_lines(value)?,
                f if Some(f) == fk_field => {
                    next.definition_ref = patch_text(field, value)?.map(DefId::new)
                }
                _ if value.is_null() => {
                    next.properties.shift_remove(field);
                }
                _ => {
                    next.properties.insert(field.clone(), value.clone());
                }
            }
        }

        // A reference and its trait copy belong to the collection of the old type
        if type_changed {
            next.traits = None;
            if !fk_field.is_some_and(|f| patch.contains_key(f)) {
                next.definition_ref = None;
            }
        }
        *self = next;
        Ok(())
    }
}

fn patch_text(field: &str, value: &Value) -> Result<Option<String>> {
    value
        .as_optional_text()
        .ok_or_else(|| Error::invalid_patch(field, format!("expected a string, got {}", value.type_name())))
}

fn patch_coords(value: &Value) -> Result<Coords> {
    let pair = value
        .as_list()
        .filter(|list| list.len() == 2)
        .ok_or_else(|| Error::invalid_patch("coords", "expected [lat, lng]"))?;
    match (pair[0].as_float(), pair[1].as_float()) {
        (Some(lat), Some(lng)) => Coords::checked(lat, lng),
        _ => Err(Error::invalid_patch("coords", "expected numbers")),
    }
}

fn patch_extra_lines(value: &Value) -> Result<Vec<ExtraLine>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let list = value
        .as_list()
        .ok_or_else(|| Error::invalid_patch("extraLines", "expected a list"))?;
    list.iter()
        .map(|line| {
            let map = line
                .as_map()
                .ok_or_else(|| Error::invalid_patch("extraLines", "expected {text, color}"))?;
            let text = map
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::invalid_patch("extraLines", "missing text"))?;
            let color = map
                .get("color")
                .and_then(|v| v.as_str())
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            Ok(ExtraLine {
                text: text.to_string(),
                color,
            })
        })
        .collect()
}
