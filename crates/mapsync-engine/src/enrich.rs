//! Merge a marker with the current fields of its definition

use crate::cache::DefinitionCache;
use mapsync_core::MarkerInstance;
use tracing::debug;

/// Produce the render-ready copy of a marker
///
/// For a marker bound to a definition that is present in the cache, every
/// definition field except its id is copied over the marker's own (the
/// definition wins; free-form properties are merged key by key). A marker
/// whose definition is missing, and any marker without a reference, comes
/// back unchanged with its inline fields.
///
/// Pure and idempotent: enriching an enriched marker against the same cache
/// yields the same value.
pub fn enrich(marker: &MarkerInstance, cache: &DefinitionCache) -> MarkerInstance {
    let mut data = marker.clone();
    let Some((kind, id)) = marker.definition_key() else {
        return data;
    };
    let Some(def) = cache.get(kind, id) else {
        debug!(marker = %marker.id, %kind, definition = %id, "definition missing, using inline fields");
        return data;
    };

    data.details = def.details.clone();
    data.traits = Some(def.traits.clone());
    data.show_in_filters = def.show_in_filters;
    for (key, value) in &def.properties {
        data.properties.insert(key.clone(), value.clone());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsync_core::{
        Coords, DefId, Definition, DefinitionKind, MarkerType, Rarity, Traits, Value,
    };

    fn cache_with_sword() -> DefinitionCache {
        let mut sword = Definition::new(
            "sword",
            "Iron Sword",
            Traits::Item {
                rarity: Rarity::Rare,
                item_type: "Weapon".into(),
            },
        );
        sword.details.image_small = Some("sword.png".into());
        sword.properties.insert("weight".into(), Value::Float(3.5));
        let mut cache = DefinitionCache::new();
        cache.replace(DefinitionKind::Item, vec![sword]);
        cache
    }

    fn sword_marker() -> MarkerInstance {
        let mut marker = MarkerInstance::new("m1", MarkerType::Item, Coords::new(1.0, 2.0), "Old Name")
            .with_definition("sword");
        marker.properties.insert("note".into(), Value::from("by the well"));
        marker.properties.insert("weight".into(), Value::Float(1.0));
        marker
    }

    #[test]
    fn test_definition_fields_win() {
        let cache = cache_with_sword();
        let data = enrich(&sword_marker(), &cache);

        assert_eq!(data.id.as_str(), "m1");
        assert_eq!(data.name(), "Iron Sword");
        assert_eq!(data.details.image_small.as_deref(), Some("sword.png"));
        assert!(matches!(data.traits, Some(Traits::Item { rarity: Rarity::Rare, .. })));
        assert_eq!(data.properties.get("weight"), Some(&Value::Float(3.5)));
        assert_eq!(data.properties.get("note"), Some(&Value::from("by the well")));
        assert_eq!(data.definition_ref, Some(DefId::new("sword")));
        assert_eq!(data.coords, Coords::new(1.0, 2.0));
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let cache = cache_with_sword();
        let markers = [
            sword_marker(),
            MarkerInstance::new("m2", MarkerType::Door, Coords::new(0.0, 0.0), "Gate"),
            MarkerInstance::new("m3", MarkerType::Item, Coords::new(0.0, 0.0), "Lost")
                .with_definition("missing"),
        ];
        for marker in &markers {
            let once = enrich(marker, &cache);
            assert_eq!(enrich(&once, &cache), once);
        }
    }

    #[test]
    fn test_missing_definition_keeps_inline_fields() {
        let marker = sword_marker();
        let data = enrich(&marker, &DefinitionCache::new());
        assert_eq!(data, marker);
    }

    #[test]
    fn test_reference_on_inline_type_is_ignored() {
        let cache = cache_with_sword();
        let mut door = MarkerInstance::new("d", MarkerType::Door, Coords::new(0.0, 0.0), "Gate");
        door.definition_ref = Some(DefId::new("sword"));
        assert_eq!(enrich(&door, &cache).name(), "Gate");
    }
}
