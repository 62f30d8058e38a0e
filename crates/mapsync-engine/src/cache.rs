//! In-memory view of the definition collections

use indexmap::IndexMap;
use mapsync_core::{DefId, Definition, DefinitionKind};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Current definitions, per kind, keyed by id
///
/// Fed only by definition snapshots. Each snapshot replaces the kind's whole
/// map; there is no merging, so a stale partial view can never be observed.
/// A failed stream leaves the last good map in place.
#[derive(Debug, Clone, Default)]
pub struct DefinitionCache {
    kinds: HashMap<DefinitionKind, IndexMap<DefId, Definition>>,
}

impl DefinitionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one definition
    pub fn get(&self, kind: DefinitionKind, id: &DefId) -> Option<&Definition> {
        self.kinds.get(&kind).and_then(|defs| defs.get(id))
    }

    /// All definitions of a kind, in snapshot order
    pub fn all(&self, kind: DefinitionKind) -> impl Iterator<Item = &Definition> {
        self.kinds.get(&kind).into_iter().flat_map(|defs| defs.values())
    }

    /// Number of cached definitions of a kind
    pub fn len(&self, kind: DefinitionKind) -> usize {
        self.kinds.get(&kind).map_or(0, IndexMap::len)
    }

    /// Whether the cache holds no definitions at all
    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(IndexMap::is_empty)
    }

    /// Whether a snapshot for this kind has been applied yet
    pub fn is_loaded(&self, kind: DefinitionKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    /// Replace a kind's definitions with a full snapshot
    ///
    /// Records whose traits belong to a different kind are dropped with a
    /// warning. Returns the number of definitions now cached for `kind`.
    pub fn replace(&mut self, kind: DefinitionKind, definitions: Vec<Definition>) -> usize {
        let mut map = IndexMap::with_capacity(definitions.len());
        for def in definitions {
            if def.kind() != kind {
                warn!(
                    expected = %kind,
                    found = %def.kind(),
                    id = %def.id,
                    "definition delivered on the wrong stream, ignoring"
                );
                continue;
            }
            map.insert(def.id.clone(), def);
        }
        let count = map.len();
        self.kinds.insert(kind, map);
        debug!(%kind, count, "definition cache replaced");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsync_core::Traits;

    fn item(id: &str, name: &str) -> Definition {
        Definition::new(id, name, Traits::default_for(DefinitionKind::Item))
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut cache = DefinitionCache::new();
        cache.replace(DefinitionKind::Item, vec![item("a", "Sword"), item("b", "Shield")]);
        assert_eq!(cache.len(DefinitionKind::Item), 2);

        cache.replace(DefinitionKind::Item, vec![item("b", "Tower Shield")]);
        assert!(cache.get(DefinitionKind::Item, &DefId::new("a")).is_none());
        assert_eq!(
            cache.get(DefinitionKind::Item, &DefId::new("b")).unwrap().name(),
            "Tower Shield"
        );
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut cache = DefinitionCache::new();
        cache.replace(DefinitionKind::Item, vec![item("a", "Sword")]);
        cache.replace(DefinitionKind::Chest, vec![]);

        assert!(cache.is_loaded(DefinitionKind::Chest));
        assert!(!cache.is_loaded(DefinitionKind::Npc));
        assert!(cache.get(DefinitionKind::Chest, &DefId::new("a")).is_none());
        assert_eq!(cache.all(DefinitionKind::Item).count(), 1);
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_wrong_kind_is_dropped() {
        let mut cache = DefinitionCache::new();
        let chest = Definition::new("c", "Crate", Traits::default_for(DefinitionKind::Chest));
        let count = cache.replace(DefinitionKind::Item, vec![chest, item("a", "Sword")]);
        assert_eq!(count, 1);
        assert!(cache.get(DefinitionKind::Item, &DefId::new("c")).is_none());
    }
}
