//! Marker registry - the mapping from marker data to visual handles
//!
//! The registry is the only component that creates, redraws or destroys
//! visuals. It reconciles itself against every marker snapshot:
//!
//! 1. Entries whose id is gone from the snapshot are torn down
//! 2. New ids get a fresh visual
//! 3. Known ids with the same type are redrawn in place
//! 4. Known ids whose type changed are torn down and recreated, since each
//!    type has its own render schema
//!
//! Lookups go through an id-keyed map, so a pass is linear in the size of
//! the snapshot plus the registry.

use crate::cache::DefinitionCache;
use crate::config::RenderConfig;
use crate::enrich::enrich;
use crate::kinds;
use crate::popup::render_popup;
use crate::render::{Icon, Renderer};
use indexmap::IndexMap;
use mapsync_core::{DefinitionKind, LootEntry, MarkerId, MarkerInstance};
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// One marker on the canvas
#[derive(Debug, Clone)]
pub struct RegistryEntry<H> {
    handle: H,
    source: MarkerInstance,
    data: MarkerInstance,
    placeholder: bool,
}

impl<H> RegistryEntry<H> {
    /// Marker id
    pub fn id(&self) -> &MarkerId {
        &self.data.id
    }

    /// Render-ready data (the marker enriched with its definition)
    pub fn data(&self) -> &MarkerInstance {
        &self.data
    }

    /// The marker exactly as the last snapshot delivered it
    pub fn source(&self) -> &MarkerInstance {
        &self.source
    }

    /// Whether the visual currently shows the placeholder icon
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub(crate) fn handle(&self) -> &H {
        &self.handle
    }
}

/// What one reconciliation pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub recreated: usize,
    pub removed: usize,
    pub unchanged: usize,
    /// Markers that could not be drawn at all; retried on the next snapshot
    pub failed: usize,
}

/// Authoritative list of markers and their visuals
#[derive(Debug)]
pub struct MarkerRegistry<H> {
    entries: IndexMap<MarkerId, RegistryEntry<H>>,
    placeholder: Icon,
}

impl<H: Clone + std::fmt::Debug> MarkerRegistry<H> {
    /// Create an empty registry
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            entries: IndexMap::new(),
            placeholder: Icon::placeholder(config),
        }
    }

    /// Every entry, for filtering and inspection
    pub fn all(&self) -> impl Iterator<Item = &RegistryEntry<H>> {
        self.entries.values()
    }

    /// Look up one entry
    pub fn get(&self, id: &MarkerId) -> Option<&RegistryEntry<H>> {
        self.entries.get(id)
    }

    /// Ids currently registered
    pub fn ids(&self) -> impl Iterator<Item = &MarkerId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reconcile against a full marker snapshot
    ///
    /// A failure to draw one marker never stops the pass: icons fall back to
    /// the placeholder, and a marker that cannot be drawn even then is left
    /// out until the next snapshot.
    pub fn sync<R>(
        &mut self,
        records: &[MarkerInstance],
        cache: &DefinitionCache,
        renderer: &mut R,
    ) -> SyncStats
    where
        R: Renderer<Handle = H>,
    {
        let mut stats = SyncStats::default();
        let incoming: HashSet<&MarkerId> = records.iter().map(|m| &m.id).collect();

        self.entries.retain(|id, entry| {
            if incoming.contains(id) {
                return true;
            }
            teardown(renderer, entry);
            stats.removed += 1;
            false
        });

        for record in records {
            let data = enrich(record, cache);
            match self.entries.get_mut(&record.id) {
                Some(entry) if entry.data.marker_type == data.marker_type => {
                    if entry.source == *record && entry.data == data {
                        stats.unchanged += 1;
                        continue;
                    }
                    entry.source = record.clone();
                    entry.data = data;
                    redraw(renderer, entry, &self.placeholder, cache);
                    stats.updated += 1;
                }
                Some(entry) => {
                    debug!(
                        marker = %record.id,
                        from = %entry.data.marker_type,
                        to = %data.marker_type,
                        "marker type changed, recreating visual"
                    );
                    teardown(renderer, entry);
                    match materialize(renderer, record, data, &self.placeholder, cache) {
                        Some(fresh) => {
                            *entry = fresh;
                            stats.recreated += 1;
                        }
                        None => {
                            self.entries.swap_remove(&record.id);
                            stats.failed += 1;
                        }
                    }
                }
                None => match materialize(renderer, record, data, &self.placeholder, cache) {
                    Some(fresh) => {
                        self.entries.insert(record.id.clone(), fresh);
                        stats.created += 1;
                    }
                    None => stats.failed += 1,
                },
            }
        }

        debug!(
            created = stats.created,
            updated = stats.updated,
            recreated = stats.recreated,
            removed = stats.removed,
            failed = stats.failed,
            "marker registry reconciled"
        );
        stats
    }

    /// Re-enrich every marker referencing a definition of `kind` and redraw
    /// the ones whose render data changed
    ///
    /// Markers whose definition disappeared fall back to their own inline
    /// fields. On an item change, markers whose loot references items only
    /// get their popup rebuilt. Returns the number of redrawn markers.
    pub fn reenrich_by_definition<R>(
        &mut self,
        kind: DefinitionKind,
        cache: &DefinitionCache,
        renderer: &mut R,
    ) -> usize
    where
        R: Renderer<Handle = H>,
    {
        let mut redrawn = 0;
        for entry in self.entries.values_mut() {
            if entry.source.definition_key().map(|(k, _)| k) != Some(kind) {
                if kind == DefinitionKind::Item && references_items(&entry.data) {
                    refresh_popup(renderer, entry, cache);
                }
                continue;
            }
            let data = enrich(&entry.source, cache);
            if data == entry.data {
                continue;
            }
            entry.data = data;
            redraw(renderer, entry, &self.placeholder, cache);
            redrawn += 1;
        }
        debug!(%kind, redrawn, "markers re-enriched");
        redrawn
    }
}

fn materialize<R: Renderer>(
    renderer: &mut R,
    record: &MarkerInstance,
    data: MarkerInstance,
    placeholder: &Icon,
    cache: &DefinitionCache,
) -> Option<RegistryEntry<R::Handle>> {
    let spec = kinds::spec(data.marker_type);
    let icon = spec.icon_for(&data);
    let (handle, is_placeholder) = match renderer.create_visual(&data, &icon) {
        Ok(handle) => (handle, false),
        Err(err) => {
            warn!(marker = %data.id, error = %err, "icon failed, drawing placeholder");
            match renderer.create_visual(&data, placeholder) {
                Ok(handle) => (handle, true),
                Err(err) => {
                    error!(marker = %data.id, error = %err, "marker could not be drawn");
                    return None;
                }
            }
        }
    };
    if let Err(err) = renderer.update_popup(&handle, &render_popup(&data, cache)) {
        warn!(marker = %data.id, error = %err, "popup failed");
    }
    Some(RegistryEntry {
        handle,
        source: record.clone(),
        data,
        placeholder: is_placeholder,
    })
}

fn redraw<R: Renderer>(
    renderer: &mut R,
    entry: &mut RegistryEntry<R::Handle>,
    placeholder: &Icon,
    cache: &DefinitionCache,
) {
    let icon = kinds::spec(entry.data.marker_type).icon_for(&entry.data);
    entry.placeholder = false;
    if let Err(err) = renderer.update_icon(&entry.handle, &entry.data, &icon) {
        warn!(marker = %entry.data.id, error = %err, "icon failed, drawing placeholder");
        entry.placeholder = true;
        if let Err(err) = renderer.update_icon(&entry.handle, &entry.data, placeholder) {
            warn!(marker = %entry.data.id, error = %err, "placeholder icon failed");
        }
    }
    refresh_popup(renderer, entry, cache);
}

fn refresh_popup<R: Renderer>(renderer: &mut R, entry: &RegistryEntry<R::Handle>, cache: &DefinitionCache) {
    if let Err(err) = renderer.update_popup(&entry.handle, &render_popup(&entry.data, cache)) {
        warn!(marker = %entry.data.id, error = %err, "popup failed");
    }
}

fn references_items(data: &MarkerInstance) -> bool {
    data.traits
        .as_ref()
        .is_some_and(|traits| traits.loot_pool().iter().any(|e| matches!(e, LootEntry::Ref(_))))
}

fn teardown<R: Renderer>(renderer: &mut R, entry: &RegistryEntry<R::Handle>) {
    let group = entry.data.marker_type;
    if renderer.has_membership(&entry.handle, group) {
        renderer.remove_from_group(&entry.handle, group);
    }
    renderer.destroy(entry.handle.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use mapsync_core::{Coords, DefId, Definition, Disposition, MarkerType, Traits};

    fn registry() -> MarkerRegistry<u64> {
        MarkerRegistry::new(&RenderConfig::default())
    }

    fn ids(reg: &MarkerRegistry<u64>) -> Vec<String> {
        let mut ids: Vec<String> = reg.ids().map(|id| id.to_string()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_sync_matches_snapshot_ids() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let cache = DefinitionCache::new();

        let snapshots = vec![
            vec![door("a", "A"), door("b", "B"), door("c", "C")],
            vec![door("b", "B"), door("d", "D")],
            vec![],
            vec![door("a", "A"), door("a", "A2")],
        ];
        for snapshot in snapshots {
            reg.sync(&snapshot, &cache, &mut canvas);
            let mut expected: Vec<String> = snapshot.iter().map(|m| m.id.to_string()).collect();
            expected.sort();
            expected.dedup();
            assert_eq!(ids(&reg), expected);
            assert_eq!(canvas.live.len(), expected.len());
        }
        assert_eq!(reg.get(&MarkerId::new("a")).unwrap().data().name(), "A2");
    }

    #[test]
    fn test_update_in_place_keeps_handle() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let cache = DefinitionCache::new();

        reg.sync(&[door("a", "Gate")], &cache, &mut canvas);
        let before = canvas.handle_of("a").unwrap();
        let stats = reg.sync(&[door("a", "Back Gate")], &cache, &mut canvas);

        assert_eq!(stats.updated, 1);
        assert_eq!(canvas.handle_of("a"), Some(before));
        assert!(canvas.live[&before].popup.contains("Back Gate"));
        assert!(canvas.destroyed.is_empty());
    }

    #[test]
    fn test_unchanged_record_is_not_redrawn() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let cache = DefinitionCache::new();

        reg.sync(&[door("a", "Gate")], &cache, &mut canvas);
        let stats = reg.sync(&[door("a", "Gate")], &cache, &mut canvas);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(canvas.icon_updates, 0);
    }

    #[test]
    fn test_type_change_recreates_visual() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let cache = DefinitionCache::new();

        reg.sync(&[door("x", "Gate")], &cache, &mut canvas);
        let old = canvas.handle_of("x").unwrap();

        let mut teleport = door("x", "Gate");
        teleport.marker_type = MarkerType::Teleport;
        let stats = reg.sync(&[teleport], &cache, &mut canvas);

        let new = canvas.handle_of("x").unwrap();
        assert_eq!(stats.recreated, 1);
        assert_ne!(old, new);
        assert!(canvas.destroyed.contains(&old));
        assert_eq!(reg.get(&MarkerId::new("x")).unwrap().data().marker_type, MarkerType::Teleport);
    }

    #[test]
    fn test_removal_leaves_group() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let cache = DefinitionCache::new();

        reg.sync(&[door("a", "Gate")], &cache, &mut canvas);
        let handle = canvas.handle_of("a").unwrap();
        canvas.add_to_group(&handle, MarkerType::Door);

        reg.sync(&[], &cache, &mut canvas);
        assert!(canvas.groups.is_empty());
        assert_eq!(canvas.destroyed, vec![handle]);
    }

    #[test]
    fn test_bad_image_falls_back_without_aborting_batch() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        canvas.broken_images.insert("broken.png".into());
        let cache = DefinitionCache::new();

        let mut bad = door("bad", "Broken");
        bad.details.image_small = Some("broken.png".into());
        let stats = reg.sync(&[door("a", "A"), bad, door("z", "Z")], &cache, &mut canvas);

        assert_eq!(stats.created, 3);
        assert_eq!(reg.len(), 3);
        let entry = reg.get(&MarkerId::new("bad")).unwrap();
        assert!(entry.is_placeholder());
        assert!(canvas.live[entry.handle()].icon.placeholder);
    }

    #[test]
    fn test_undrawable_marker_is_retried_next_snapshot() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        canvas.broken_images.insert("broken.png".into());
        canvas.fail_placeholder = true;
        let cache = DefinitionCache::new();

        let mut bad = door("bad", "Broken");
        bad.details.image_small = Some("broken.png".into());
        let stats = reg.sync(&[door("a", "A"), bad.clone()], &cache, &mut canvas);
        assert_eq!(stats.failed, 1);
        assert_eq!(reg.len(), 1);

        canvas.fail_placeholder = false;
        let stats = reg.sync(&[door("a", "A"), bad], &cache, &mut canvas);
        assert_eq!(stats.created, 1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_reenrich_follows_definition_updates_and_deletes() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let mut cache = DefinitionCache::new();
        cache.replace(DefinitionKind::Item, vec![item_def("A", "Sword")]);

        reg.sync(&[item_marker("m1", "A"), door("d", "Gate")], &cache, &mut canvas);
        let handle = canvas.handle_of("m1").unwrap();
        assert_eq!(reg.get(&MarkerId::new("m1")).unwrap().data().name(), "Sword");

        cache.replace(DefinitionKind::Item, vec![item_def("A", "Great Sword")]);
        assert_eq!(reg.reenrich_by_definition(DefinitionKind::Item, &cache, &mut canvas), 1);
        assert_eq!(reg.get(&MarkerId::new("m1")).unwrap().data().name(), "Great Sword");
        assert!(canvas.live[&handle].popup.contains("Great Sword"));

        cache.replace(DefinitionKind::Item, vec![]);
        reg.reenrich_by_definition(DefinitionKind::Item, &cache, &mut canvas);
        let entry = reg.get(&MarkerId::new("m1")).unwrap();
        assert_eq!(entry.data().name(), "inline");
        assert_eq!(entry.data().traits, None);
        assert_eq!(canvas.handle_of("m1"), Some(handle));
    }

    #[test]
    fn test_item_rename_refreshes_loot_popups() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let mut cache = DefinitionCache::new();
        cache.replace(DefinitionKind::Item, vec![item_def("pelt", "Pelt")]);
        cache.replace(
            DefinitionKind::Npc,
            vec![Definition::new(
                "wolf",
                "Wolf",
                Traits::Npc {
                    disposition: Disposition::Hostile,
                    tier: 1,
                    loot_pool: vec![LootEntry::Ref(DefId::new("pelt"))],
                },
            )],
        );
        reg.sync(&[npc_marker("n1", "wolf")], &cache, &mut canvas);
        let handle = canvas.handle_of("n1").unwrap();
        assert!(canvas.live[&handle].popup.contains("<li>Pelt</li>"));

        cache.replace(DefinitionKind::Item, vec![item_def("pelt", "Thick Pelt")]);
        assert_eq!(reg.reenrich_by_definition(DefinitionKind::Item, &cache, &mut canvas), 0);
        assert!(canvas.live[&handle].popup.contains("<li>Thick Pelt</li>"));
        assert_eq!(canvas.icon_updates, 0);
    }

    #[test]
    fn test_reenrich_ignores_other_kinds() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let mut cache = DefinitionCache::new();
        cache.replace(DefinitionKind::Item, vec![item_def("A", "Sword")]);
        reg.sync(&[item_marker("m1", "A")], &cache, &mut canvas);

        assert_eq!(reg.reenrich_by_definition(DefinitionKind::Npc, &cache, &mut canvas), 0);
        assert_eq!(reg.reenrich_by_definition(DefinitionKind::Item, &cache, &mut canvas), 0);
    }

    #[test]
    fn test_same_spot_upsert_never_duplicates() {
        let mut reg = registry();
        let mut canvas = RecordingRenderer::new();
        let cache = DefinitionCache::new();
        let coords = Coords::new(12.3456, 78.9012);

        let first = mapsync_core::MarkerInstance::new(coords.marker_id(), MarkerType::Door, coords, "One");
        reg.sync(&[first], &cache, &mut canvas);
        let second = mapsync_core::MarkerInstance::new(coords.marker_id(), MarkerType::Door, coords, "Two");
        reg.sync(&[second], &cache, &mut canvas);

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.all().next().unwrap().data().name(), "Two");
    }
}
