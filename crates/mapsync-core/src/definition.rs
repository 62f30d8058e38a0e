//! Definition documents: the remote templates markers point at

use crate::{DefId, DefinitionKind, ValueMap};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One colored line of flavor text under a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraLine {
    pub text: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl ExtraLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Some(color.into()),
        }
    }
}

/// Display fields shared by definitions and inline marker copies
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Details {
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Flavor lines rendered below the name
    #[serde(default)]
    pub extra_lines: Vec<ExtraLine>,
    /// Icon image URL
    #[serde(default)]
    pub image_small: Option<String>,
    /// Popup image URL
    #[serde(default)]
    pub image_large: Option<String>,
}

impl Details {
    /// Details with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Item rarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

/// Chest sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChestSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ChestSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChestSize::Small => "small",
            ChestSize::Medium => "medium",
            ChestSize::Large => "large",
        }
    }
}

/// How an NPC treats the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Disposition {
    Friendly,
    #[default]
    Neutral,
    Hostile,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Friendly => "friendly",
            Disposition::Neutral => "neutral",
            Disposition::Hostile => "hostile",
        }
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, Disposition::Hostile)
    }
}

/// One entry of a chest or NPC loot pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LootEntry {
    /// Reference to an item definition
    Ref(DefId),
    /// Inline loot object for drops that have no item definition
    Embedded(ValueMap),
}

impl LootEntry {
    /// Label for popups: the referenced id or the embedded `name` field
    pub fn label(&self) -> String {
        match self {
            LootEntry::Ref(id) => id.to_string(),
            LootEntry::Embedded(map) => map
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("unnamed")
                .to_string(),
        }
    }
}

/// Kind-specific definition fields
///
/// The variant *is* the definition kind, so a definition can never carry
/// fields of a different kind than the collection it lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Traits {
    Item {
        #[serde(default)]
        rarity: Rarity,
        #[serde(default)]
        item_type: String,
    },
    Chest {
        #[serde(default)]
        category: String,
        #[serde(default)]
        size: ChestSize,
        #[serde(default)]
        loot_pool: Vec<LootEntry>,
    },
    Npc {
        #[serde(default)]
        disposition: Disposition,
        #[serde(default)]
        tier: u8,
        #[serde(default)]
        loot_pool: Vec<LootEntry>,
    },
}

impl Traits {
    /// The definition kind these traits belong to
    pub fn kind(&self) -> DefinitionKind {
        match self {
            Traits::Item { .. } => DefinitionKind::Item,
            Traits::Chest { .. } => DefinitionKind::Chest,
            Traits::Npc { .. } => DefinitionKind::Npc,
        }
    }

    /// Default traits for a kind, used by forms creating a new definition
    pub fn default_for(kind: DefinitionKind) -> Self {
        match kind {
            DefinitionKind::Item => Traits::Item {
                rarity: Rarity::default(),
                item_type: String::new(),
            },
            DefinitionKind::Chest => Traits::Chest {
                category: String::new(),
                size: ChestSize::default(),
                loot_pool: Vec::new(),
            },
            DefinitionKind::Npc => Traits::Npc {
                disposition: Disposition::default(),
                tier: 0,
                loot_pool: Vec::new(),
            },
        }
    }

    /// Loot pool, empty for items
    pub fn loot_pool(&self) -> &[LootEntry] {
        match self {
            Traits::Item { .. } => &[],
            Traits::Chest { loot_pool, .. } | Traits::Npc { loot_pool, .. } => loot_pool,
        }
    }
}

/// A definition without an id, as submitted to the store for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDraft {
    pub details: Details,
    pub traits: Traits,
    #[serde(default = "default_show_in_filters")]
    pub show_in_filters: bool,
    #[serde(default)]
    pub properties: ValueMap,
}

impl DefinitionDraft {
    pub fn new(name: impl Into<String>, traits: Traits) -> Self {
        Self {
            details: Details::named(name),
            traits,
            show_in_filters: true,
            properties: ValueMap::new(),
        }
    }

    /// Attach the store-assigned id
    pub fn into_definition(self, id: DefId) -> Definition {
        Definition {
            id,
            details: self.details,
            traits: self.traits,
            show_in_filters: self.show_in_filters,
            properties: self.properties,
        }
    }
}

fn default_show_in_filters() -> bool {
    true
}

/// A remotely stored template (Item, Chest or NPC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Store-assigned identity
    pub id: DefId,
    /// Display fields copied onto referencing markers
    pub details: Details,
    /// Kind-specific fields
    pub traits: Traits,
    /// Whether the definition gets a row in the filter sidebar
    #[serde(default = "default_show_in_filters")]
    pub show_in_filters: bool,
    /// Free-form extra fields
    #[serde(default)]
    pub properties: ValueMap,
}

impl Definition {
    /// Create a definition with default details
    pub fn new(id: impl Into<DefId>, name: impl Into<String>, traits: Traits) -> Self {
        DefinitionDraft::new(name, traits).into_definition(id.into())
    }

    /// The collection this definition belongs to
    pub fn kind(&self) -> DefinitionKind {
        self.traits.kind()
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    /// Copy of every field but the id
    pub fn to_draft(&self) -> DefinitionDraft {
        DefinitionDraft {
            details: self.details.clone(),
            traits: self.traits.clone(),
            show_in_filters: self.show_in_filters,
            properties: self.properties.clone(),
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.kind(), self.id, self.details.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_kind_follows_traits() {
        let def = Definition::new("a", "Sword", Traits::default_for(DefinitionKind::Item));
        assert_eq!(def.kind(), DefinitionKind::Item);
        assert!(def.show_in_filters);

        let chest = Definition::new("c", "Crate", Traits::default_for(DefinitionKind::Chest));
        assert_eq!(chest.kind(), DefinitionKind::Chest);
        assert!(chest.traits.loot_pool().is_empty());
    }

    #[test]
    fn test_definition_ron() {
        let ron_str = r##"
        (
            id: "wolf",
            details: (
                name: "Grey Wolf",
                description: "Hunts in packs",
                extra_lines: [(text: "Night only", color: Some("#8888ff"))],
            ),
            traits: Npc(disposition: Hostile, tier: 2, loot_pool: [Ref("pelt")]),
        )
        "##;

        let def: Definition = ron::from_str(ron_str).unwrap();
        assert_eq!(def.id.as_str(), "wolf");
        assert_eq!(def.kind(), DefinitionKind::Npc);
        assert!(def.show_in_filters);
        assert_eq!(def.traits.loot_pool(), &[LootEntry::Ref(DefId::new("pelt"))]);
        assert_eq!(def.details.extra_lines[0].color.as_deref(), Some("#8888ff"));
    }

    #[test]
    fn test_loot_labels() {
        let mut embedded = ValueMap::new();
        embedded.insert("name".into(), Value::from("Gold Coin"));
        assert_eq!(LootEntry::Embedded(embedded).label(), "Gold Coin");
        assert_eq!(LootEntry::Embedded(ValueMap::new()).label(), "unnamed");
        assert_eq!(LootEntry::Ref(DefId::new("gem")).label(), "gem");
    }

    #[test]
    fn test_draft_round_trip_keeps_fields() {
        let mut def = Definition::new("x", "Key", Traits::default_for(DefinitionKind::Item));
        def.show_in_filters = false;
        let copy = def.to_draft().into_definition(DefId::new("x"));
        assert_eq!(copy, def);
    }
}
