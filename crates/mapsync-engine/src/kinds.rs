//! Per-type dispatch table
//!
//! Everything that differs between marker types (icon, popup subtitle,
//! category membership) is looked up here through [`spec`]. The table is
//! closed: one record per [`MarkerType`] variant.

use crate::render::Icon;
use mapsync_core::{ChestSize, DefinitionKind, Disposition, MarkerInstance, MarkerType, Rarity, Traits};

/// How one marker type is drawn and filtered
pub struct KindSpec {
    /// The type this record describes
    pub marker_type: MarkerType,
    /// Sidebar and popup label
    pub label: &'static str,
    /// Glyph drawn when the marker has no image
    pub glyph: &'static str,
    /// Fallback color
    pub color: &'static str,
    /// Icon factory
    pub icon: fn(&KindSpec, &MarkerInstance) -> Icon,
    /// Second popup line, below the name
    pub popup_subtitle: fn(&MarkerInstance) -> Option<String>,
    /// Membership in the globally toggled category, for types subject to it
    pub category: Option<fn(&MarkerInstance) -> bool>,
}

impl KindSpec {
    /// Definition collection referenced by this type
    pub fn definition_kind(&self) -> Option<DefinitionKind> {
        self.marker_type.definition_kind()
    }

    /// Document field carrying the foreign key
    pub fn foreign_key_field(&self) -> Option<&'static str> {
        self.marker_type.foreign_key_field()
    }

    /// Whether `data` belongs to the globally toggled category
    pub fn in_category(&self, data: &MarkerInstance) -> bool {
        self.category.is_some_and(|member| member(data))
    }

    /// Build the icon for a marker of this type
    pub fn icon_for(&self, data: &MarkerInstance) -> Icon {
        (self.icon)(self, data)
    }
}

impl std::fmt::Debug for KindSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindSpec")
            .field("marker_type", &self.marker_type)
            .field("label", &self.label)
            .field("category", &self.category.is_some())
            .finish()
    }
}

static KINDS: [KindSpec; 5] = [
    KindSpec {
        marker_type: MarkerType::Item,
        label: "Item",
        glyph: "I",
        color: "#9e9e9e",
        icon: item_icon,
        popup_subtitle: item_subtitle,
        category: None,
    },
    KindSpec {
        marker_type: MarkerType::Chest,
        label: "Chest",
        glyph: "C",
        color: "#c8a04a",
        icon: chest_icon,
        popup_subtitle: chest_subtitle,
        category: None,
    },
    KindSpec {
        marker_type: MarkerType::Npc,
        label: "NPC",
        glyph: "N",
        color: "#e0c341",
        icon: npc_icon,
        popup_subtitle: npc_subtitle,
        category: Some(is_non_hostile as fn(&MarkerInstance) -> bool),
    },
    KindSpec {
        marker_type: MarkerType::Door,
        label: "Door",
        glyph: "D",
        color: "#8d6e63",
        icon: plain_icon,
        popup_subtitle: no_subtitle,
        category: None,
    },
    KindSpec {
        marker_type: MarkerType::Teleport,
        label: "Teleport",
        glyph: "T",
        color: "#7e57c2",
        icon: plain_icon,
        popup_subtitle: teleport_subtitle,
        category: None,
    },
];

/// The dispatch record for a marker type
pub fn spec(marker_type: MarkerType) -> &'static KindSpec {
    match marker_type {
        MarkerType::Item => &KINDS[0],
        MarkerType::Chest => &KINDS[1],
        MarkerType::Npc => &KINDS[2],
        MarkerType::Door => &KINDS[3],
        MarkerType::Teleport => &KINDS[4],
    }
}

/// Display color of a rarity tier
pub fn rarity_color(rarity: Rarity) -> &'static str {
    match rarity {
        Rarity::Common => "#9e9e9e",
        Rarity::Uncommon => "#4caf50",
        Rarity::Rare => "#2196f3",
        Rarity::Epic => "#9c27b0",
        Rarity::Legendary => "#ff9800",
    }
}

fn disposition_color(disposition: Disposition) -> &'static str {
    match disposition {
        Disposition::Friendly => "#4caf50",
        Disposition::Neutral => "#e0c341",
        Disposition::Hostile => "#e53935",
    }
}

fn base_icon(spec: &KindSpec, data: &MarkerInstance) -> Icon {
    Icon {
        image: data.details.image_small.clone(),
        glyph: spec.glyph.to_string(),
        color: spec.color.to_string(),
        size: Icon::DEFAULT_SIZE,
        placeholder: false,
    }
}

fn plain_icon(spec: &KindSpec, data: &MarkerInstance) -> Icon {
    base_icon(spec, data)
}

fn item_icon(spec: &KindSpec, data: &MarkerInstance) -> Icon {
    let mut icon = base_icon(spec, data);
    if let Some(Traits::Item { rarity, .. }) = &data.traits {
        icon.color = rarity_color(*rarity).to_string();
    }
    icon
}

fn chest_icon(spec: &KindSpec, data: &MarkerInstance) -> Icon {
    let mut icon = base_icon(spec, data);
    if let Some(Traits::Chest { size, .. }) = &data.traits {
        icon.size = match size {
            ChestSize::Small => 18,
            ChestSize::Medium => Icon::DEFAULT_SIZE,
            ChestSize::Large => 32,
        };
    }
    icon
}

fn npc_icon(spec: &KindSpec, data: &MarkerInstance) -> Icon {
    let mut icon = base_icon(spec, data);
    if let Some(Traits::Npc { disposition, .. }) = &data.traits {
        icon.color = disposition_color(*disposition).to_string();
    }
    icon
}

fn item_subtitle(data: &MarkerInstance) -> Option<String> {
    match &data.traits {
        Some(Traits::Item { rarity, item_type }) if item_type.is_empty() => {
            Some(capitalize(rarity.as_str()))
        }
        Some(Traits::Item { rarity, item_type }) => {
            Some(format!("{} {}", capitalize(rarity.as_str()), item_type))
        }
        _ => None,
    }
}

fn chest_subtitle(data: &MarkerInstance) -> Option<String> {
    match &data.traits {
        Some(Traits::Chest { category, size, .. }) if category.is_empty() => {
            Some(format!("{} chest", capitalize(size.as_str())))
        }
        Some(Traits::Chest { category, size, .. }) => {
            Some(format!("{} chest · {}", capitalize(size.as_str()), category))
        }
        _ => None,
    }
}

fn npc_subtitle(data: &MarkerInstance) -> Option<String> {
    match &data.traits {
        Some(Traits::Npc { disposition, tier, .. }) => Some(format!(
            "{} · Tier {}",
            capitalize(disposition.as_str()),
            tier
        )),
        _ => None,
    }
}

fn teleport_subtitle(data: &MarkerInstance) -> Option<String> {
    data.properties
        .get("destination")
        .and_then(|v| v.as_str())
        .map(|dest| format!("To {dest}"))
}

fn no_subtitle(_: &MarkerInstance) -> Option<String> {
    None
}

fn is_non_hostile(data: &MarkerInstance) -> bool {
    matches!(&data.traits, Some(Traits::Npc { disposition, .. }) if !disposition.is_hostile())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
