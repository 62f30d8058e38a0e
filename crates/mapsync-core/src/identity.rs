//! Identity types for definitions, markers and their kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier for a definition document (Item, Chest or NPC template)
///
/// Assigned by the remote store on creation and otherwise opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(pub String);

impl DefId {
    /// Create a new definition ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DefId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DefId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier for a placed marker
///
/// Either an opaque store id or the coordinate key produced by
/// [`Coords::key`](crate::Coords::key) for markers created by clicking the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub String);

impl MarkerId {
    /// Create a new marker ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MarkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The remote definition collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefinitionKind {
    Item,
    Chest,
    Npc,
}

impl DefinitionKind {
    /// Every definition kind, in sidebar order
    pub const ALL: [DefinitionKind; 3] =
        [DefinitionKind::Item, DefinitionKind::Chest, DefinitionKind::Npc];

    /// Collection name used by stores and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Item => "item",
            DefinitionKind::Chest => "chest",
            DefinitionKind::Npc => "npc",
        }
    }

    /// The marker type whose instances reference this kind
    pub fn marker_type(&self) -> MarkerType {
        match self {
            DefinitionKind::Item => MarkerType::Item,
            DefinitionKind::Chest => MarkerType::Chest,
            DefinitionKind::Npc => MarkerType::Npc,
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefinitionKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "item" => Ok(DefinitionKind::Item),
            "chest" => Ok(DefinitionKind::Chest),
            "npc" => Ok(DefinitionKind::Npc),
            other => Err(crate::Error::InvalidOperation(format!(
                "unknown definition kind `{other}`"
            ))),
        }
    }
}

/// The closed set of marker types that can be placed on the map
///
/// Item, Chest and Npc markers reference a definition; Door and Teleport
/// markers carry all of their display fields inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarkerType {
    Item,
    Chest,
    Npc,
    Door,
    Teleport,
}

impl MarkerType {
    /// Every marker type, in sidebar order
    pub const ALL: [MarkerType; 5] = [
        MarkerType::Item,
        MarkerType::Chest,
        MarkerType::Npc,
        MarkerType::Door,
        MarkerType::Teleport,
    ];

    /// Document value of the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerType::Item => "Item",
            MarkerType::Chest => "Chest",
            MarkerType::Npc => "NPC",
            MarkerType::Door => "Door",
            MarkerType::Teleport => "Teleport",
        }
    }

    /// The definition collection instances of this type point into, if any
    pub fn definition_kind(&self) -> Option<DefinitionKind> {
        match self {
            MarkerType::Item => Some(DefinitionKind::Item),
            MarkerType::Chest => Some(DefinitionKind::Chest),
            MarkerType::Npc => Some(DefinitionKind::Npc),
            MarkerType::Door | MarkerType::Teleport => None,
        }
    }

    /// Document field holding the definition foreign key
    pub fn foreign_key_field(&self) -> Option<&'static str> {
        match self {
            MarkerType::Item => Some("predefinedItemId"),
            MarkerType::Chest => Some("chestTypeId"),
            MarkerType::Npc => Some("npcDefinitionId"),
            MarkerType::Door | MarkerType::Teleport => None,
        }
    }
}

impl fmt::Display for MarkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "item" => Ok(MarkerType::Item),
            "chest" => Ok(MarkerType::Chest),
            "npc" => Ok(MarkerType::Npc),
            "door" => Ok(MarkerType::Door),
            "teleport" => Ok(MarkerType::Teleport),
            other => Err(crate::Error::InvalidOperation(format!(
                "unknown marker type `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_def_id() {
        let id = DefId::new("sword");
        assert_eq!(id.as_str(), "sword");
        assert_eq!(format!("{}", id), "sword");
    }

    #[test]
    fn test_marker_type_round_trips_through_document_name() {
        for ty in MarkerType::ALL {
            assert_eq!(ty.as_str().parse::<MarkerType>().unwrap(), ty);
        }
        assert!("Portal".parse::<MarkerType>().is_err());
    }

    #[test]
    fn test_foreign_keys_follow_definition_kind() {
        for ty in MarkerType::ALL {
            assert_eq!(ty.definition_kind().is_some(), ty.foreign_key_field().is_some());
        }
        for kind in DefinitionKind::ALL {
            assert_eq!(kind.marker_type().definition_kind(), Some(kind));
        }
        assert_eq!(MarkerType::Chest.foreign_key_field(), Some("chestTypeId"));
    }
}
