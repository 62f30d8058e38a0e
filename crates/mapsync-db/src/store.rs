//! Database store wrapper.

use crate::error::{Error, Result};
use crate::feeds::Feeds;
use crate::models::*;
use mapsync_core::{
    DefId, Definition, DefinitionDraft, DefinitionKind, DefinitionStore, MarkerDraft, MarkerId,
    MarkerInstance, MarkerStore, SnapshotSink, Subscription, ValueMap,
};
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredDefinition>().unwrap();
    models.define::<StoredMarker>().unwrap();
    models.define::<StoredCounter>().unwrap();
    models
});

/// Marker and definition collections with live full-snapshot feeds.
///
/// Every committed write republishes the affected stream to its
/// subscribers; callers never see their writes any other way.
pub struct Store {
    pub(crate) db: Database<'static>,
    pub(crate) feeds: Feeds,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        info!(path = %path.as_ref().display(), "marker store opened");
        Ok(Self {
            db,
            feeds: Feeds::default(),
        })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self {
            db,
            feeds: Feeds::default(),
        })
    }

    /// Load every definition of one kind.
    pub fn definitions(&self, kind: DefinitionKind) -> Result<Vec<Definition>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredDefinition>(StoredDefinitionKey::kind)?;
        let iter = scan.start_with(kind.as_str())?;
        let stored: std::result::Result<Vec<StoredDefinition>, _> = iter.collect();
        let stored = stored.map_err(|e| Error::Database(e.to_string()))?;
        stored.iter().map(StoredDefinition::to_definition).collect()
    }

    /// Load one definition.
    pub fn definition(&self, kind: DefinitionKind, id: &DefId) -> Result<Option<Definition>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredDefinition> = r.get().primary(StoredDefinition::key_of(kind, id))?;
        stored.map(|s| s.to_definition()).transpose()
    }

    /// Load every marker.
    pub fn markers(&self) -> Result<Vec<MarkerInstance>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredMarker>()?;
        let iter = scan.all()?;
        let stored: std::result::Result<Vec<StoredMarker>, _> = iter.collect();
        let stored = stored.map_err(|e| Error::Database(e.to_string()))?;
        stored.iter().map(StoredMarker::to_marker).collect()
    }

    /// Load one marker.
    pub fn marker(&self, id: &MarkerId) -> Result<Option<MarkerInstance>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredMarker> = r.get().primary(id.as_str().to_string())?;
        stored.map(|s| s.to_marker()).transpose()
    }

    /// Insert or overwrite the marker at the draft's coordinate key.
    pub fn put_marker(&self, draft: MarkerDraft) -> Result<MarkerId> {
        draft.coords.validate()?;
        let marker = MarkerInstance::from_draft(draft);
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredMarker::from_marker(&marker)?)?;
        rw.commit()?;
        debug!(marker = %marker.id, "marker upserted");
        self.publish_markers();
        Ok(marker.id)
    }

    /// Apply a partial-field patch to a stored marker.
    pub fn patch_marker(&self, id: &MarkerId, patch: &ValueMap) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredMarker> = rw.get().primary(id.as_str().to_string())?;
        let stored = stored.ok_or_else(|| mapsync_core::Error::MarkerNotFound(id.to_string()))?;
        let mut marker = stored.to_marker()?;
        marker.apply_patch(patch)?;
        rw.upsert(StoredMarker::from_marker(&marker)?)?;
        rw.commit()?;
        debug!(marker = %id, fields = patch.len(), "marker patched");
        self.publish_markers();
        Ok(())
    }

    /// Delete a stored marker.
    pub fn remove_marker(&self, id: &MarkerId) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredMarker> = rw.get().primary(id.as_str().to_string())?;
        let stored = stored.ok_or_else(|| mapsync_core::Error::MarkerNotFound(id.to_string()))?;
        rw.remove(stored)?;
        rw.commit()?;
        debug!(marker = %id, "marker deleted");
        self.publish_markers();
        Ok(())
    }

    /// Store a new definition under a fresh "{kind}-{n}" id.
    pub fn insert_definition(&self, draft: DefinitionDraft) -> Result<DefId> {
        let kind = draft.traits.kind();
        let rw = self.db.rw_transaction()?;
        let counter: Option<StoredCounter> = rw.get().primary(StoredCounter::name_for(kind))?;
        let mut next = counter.map(|c| c.value).unwrap_or(0);
        let id = loop {
            next += 1;
            let id = DefId::new(format!("{}-{}", kind, next));
            let taken: Option<StoredDefinition> =
                rw.get().primary(StoredDefinition::key_of(kind, &id))?;
            if taken.is_none() {
                break id;
            }
        };
        rw.upsert(StoredCounter {
            name: StoredCounter::name_for(kind),
            value: next,
        })?;
        let definition = draft.into_definition(id.clone());
        rw.upsert(StoredDefinition::from_definition(&definition)?)?;
        rw.commit()?;
        debug!(%kind, id = %id, "definition created");
        self.publish_definitions(kind);
        Ok(id)
    }

    /// Replace an existing definition.
    pub fn replace_definition(&self, definition: &Definition) -> Result<()> {
        let kind = definition.kind();
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredDefinition> =
            rw.get().primary(StoredDefinition::key_of(kind, &definition.id))?;
        if stored.is_none() {
            return Err(mapsync_core::Error::DefinitionNotFound {
                kind: kind.to_string(),
                id: definition.id.to_string(),
            }
            .into());
        }
        rw.upsert(StoredDefinition::from_definition(definition)?)?;
        rw.commit()?;
        debug!(%kind, id = %definition.id, "definition updated");
        self.publish_definitions(kind);
        Ok(())
    }

    /// Delete a definition. Markers referencing it are left as they are.
    pub fn remove_definition(&self, kind: DefinitionKind, id: &DefId) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredDefinition> = rw.get().primary(StoredDefinition::key_of(kind, id))?;
        let stored = stored.ok_or_else(|| mapsync_core::Error::DefinitionNotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        })?;
        rw.remove(stored)?;
        rw.commit()?;
        debug!(%kind, id = %id, "definition deleted");
        self.publish_definitions(kind);
        Ok(())
    }

    /// Number of live feed subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.feeds.subscriber_count()
    }

    pub(crate) fn publish_markers(&self) {
        self.feeds.publish_markers(|| self.markers());
    }

    pub(crate) fn publish_definitions(&self, kind: DefinitionKind) {
        self.feeds.publish_definitions(kind, || self.definitions(kind));
    }
}

impl DefinitionStore for Store {
    fn load_definitions(&self, kind: DefinitionKind) -> mapsync_core::Result<Vec<Definition>> {
        Ok(self.definitions(kind)?)
    }

    fn create_definition(&self, draft: DefinitionDraft) -> mapsync_core::Result<DefId> {
        Ok(self.insert_definition(draft)?)
    }

    fn update_definition(&self, definition: &Definition) -> mapsync_core::Result<()> {
        Ok(self.replace_definition(definition)?)
    }

    fn delete_definition(&self, kind: DefinitionKind, id: &DefId) -> mapsync_core::Result<()> {
        Ok(self.remove_definition(kind, id)?)
    }

    fn subscribe_definitions(
        &self,
        kind: DefinitionKind,
        sink: SnapshotSink<Definition>,
    ) -> mapsync_core::Result<Subscription> {
        Ok(self
            .feeds
            .subscribe_definitions(kind, sink, || self.definitions(kind))?)
    }
}

impl MarkerStore for Store {
    fn load_markers(&self) -> mapsync_core::Result<Vec<MarkerInstance>> {
        Ok(self.markers()?)
    }

    fn upsert_marker_by_coords(&self, draft: MarkerDraft) -> mapsync_core::Result<MarkerId> {
        Ok(self.put_marker(draft)?)
    }

    fn update_marker(&self, id: &MarkerId, patch: &ValueMap) -> mapsync_core::Result<()> {
        Ok(self.patch_marker(id, patch)?)
    }

    fn delete_marker(&self, id: &MarkerId) -> mapsync_core::Result<()> {
        Ok(self.remove_marker(id)?)
    }

    fn subscribe_markers(
        &self,
        sink: SnapshotSink<MarkerInstance>,
    ) -> mapsync_core::Result<Subscription> {
        Ok(self.feeds.subscribe_markers(sink, || self.markers())?)
    }
}
