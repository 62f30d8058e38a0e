//! Session owner and event router
//!
//! The coordinator owns the cache, the registry, the filter engine and the
//! renderer. Backend sinks never touch that state: they push [`SyncEvent`]s
//! into an inbox, and [`SyncCoordinator::pump`] applies them on the thread
//! that owns the coordinator.

use crate::cache::DefinitionCache;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::filter::{DefinitionRow, FilterEngine, VisibilityReport};
use crate::registry::MarkerRegistry;
use crate::render::Renderer;
use crate::sequence::{SequenceGuard, StreamKey};
use mapsync_core::{
    Backend, Coords, DefId, Definition, DefinitionDraft, DefinitionKind, MarkerDraft, MarkerId,
    MarkerInstance, MarkerType, StreamResult, Subscription, ValueMap,
};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One delivery from a backend stream
#[derive(Debug)]
pub enum SyncEvent {
    Markers(StreamResult<MarkerInstance>),
    Definitions(DefinitionKind, StreamResult<Definition>),
}

/// A user edit to the filter sidebar or search box
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    Type(MarkerType, bool),
    AllTypes(bool),
    Definition(DefinitionKind, DefId, bool),
    Category(bool),
    Query(String),
    Reset,
}

struct Session {
    backend: Arc<dyn Backend>,
    subscriptions: Vec<Subscription>,
    inbox: Receiver<SyncEvent>,
}

/// Keeps a canvas in sync with a backend and the user's filters
pub struct SyncCoordinator<R: Renderer> {
    renderer: R,
    cache: DefinitionCache,
    registry: MarkerRegistry<R::Handle>,
    filter: FilterEngine,
    guard: SequenceGuard,
    session: Option<Session>,
}

impl<R: Renderer> SyncCoordinator<R> {
    pub fn new(config: SyncConfig, renderer: R) -> Self {
        Self {
            renderer,
            cache: DefinitionCache::new(),
            registry: MarkerRegistry::new(&config.render),
            filter: FilterEngine::new(config.filter),
            guard: SequenceGuard::new(),
            session: None,
        }
    }

    /// Subscribe to every definition collection and to the markers
    ///
    /// Definition streams are opened first so their initial snapshots are
    /// queued ahead of the first marker snapshot.
    pub fn start(&mut self, backend: Arc<dyn Backend>) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::AlreadyRunning);
        }
        self.guard.reset();
        let (tx, inbox) = mpsc::channel();
        let mut subscriptions = Vec::with_capacity(DefinitionKind::ALL.len() + 1);

        for kind in DefinitionKind::ALL {
            let tx = tx.clone();
            let sub = backend.subscribe_definitions(
                kind,
                Arc::new(move |result| {
                    let _ = tx.send(SyncEvent::Definitions(kind, result));
                }),
            )?;
            subscriptions.push(sub);
        }
        let sub = backend.subscribe_markers(Arc::new(move |result| {
            let _ = tx.send(SyncEvent::Markers(result));
        }))?;
        subscriptions.push(sub);

        info!(streams = subscriptions.len(), "sync session started");
        self.session = Some(Session {
            backend,
            subscriptions,
            inbox,
        });
        Ok(())
    }

    /// Unsubscribe every stream and drop whatever is still queued
    ///
    /// The cache, registry and visuals stay as they were.
    pub fn stop(&mut self) -> Result<()> {
        let session = self.session.take().ok_or(Error::NotRunning)?;
        for sub in session.subscriptions {
            sub.unsubscribe();
        }
        let dropped = session.inbox.try_iter().count();
        info!(dropped, "sync session stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Apply every queued event. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let events: Vec<SyncEvent> = match &self.session {
            Some(session) => session.inbox.try_iter().collect(),
            None => return 0,
        };
        let mut applied = 0;
        for event in events {
            if self.handle(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one stream event. Returns false if it was stale or an error.
    pub fn handle(&mut self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::Markers(Ok(snapshot)) => {
                if !self.guard.accept(StreamKey::Markers, snapshot.seq) {
                    debug!(seq = snapshot.seq, "stale marker snapshot discarded");
                    return false;
                }
                let stats = self
                    .registry
                    .sync(&snapshot.records, &self.cache, &mut self.renderer);
                let report = self.filter.apply_all(&self.registry, &mut self.renderer);
                info!(
                    seq = snapshot.seq,
                    markers = self.registry.len(),
                    created = stats.created,
                    removed = stats.removed,
                    visible = report.shown,
                    "marker snapshot applied"
                );
                true
            }
            SyncEvent::Definitions(kind, Ok(snapshot)) => {
                let stream = StreamKey::Definitions(kind);
                if !self.guard.accept(stream, snapshot.seq) {
                    debug!(%stream, seq = snapshot.seq, "stale definition snapshot discarded");
                    return false;
                }
                let count = self.cache.replace(kind, snapshot.records);
                let redrawn =
                    self.registry
                        .reenrich_by_definition(kind, &self.cache, &mut self.renderer);
                self.filter.apply_all(&self.registry, &mut self.renderer);
                info!(%kind, seq = snapshot.seq, definitions = count, redrawn, "definition snapshot applied");
                true
            }
            SyncEvent::Markers(Err(err)) => {
                warn!(error = %err, "marker stream failed, keeping last snapshot");
                false
            }
            SyncEvent::Definitions(kind, Err(err)) => {
                warn!(%kind, error = %err, "definition stream failed, keeping last snapshot");
                false
            }
        }
    }

    /// Change the filter state and reapply visibility
    pub fn apply_filter_change(&mut self, change: FilterChange) -> VisibilityReport {
        debug!(?change, "filter change");
        let changed = match change {
            FilterChange::Type(ty, enabled) => self.filter.state_mut().set_type_enabled(ty, enabled),
            FilterChange::AllTypes(enabled) => self.filter.state_mut().set_all_types(enabled),
            FilterChange::Definition(kind, id, enabled) => {
                self.filter.state_mut().set_definition_enabled(kind, id, enabled)
            }
            FilterChange::Category(enabled) => self.filter.state_mut().set_category_toggle(enabled),
            FilterChange::Query(query) => self.filter.state_mut().set_query(&query),
            FilterChange::Reset => self.filter.reset(),
        };
        if !changed {
            debug!("filter state unchanged");
        }
        self.filter.apply_all(&self.registry, &mut self.renderer)
    }

    pub fn set_type_enabled(&mut self, marker_type: MarkerType, enabled: bool) -> VisibilityReport {
        self.apply_filter_change(FilterChange::Type(marker_type, enabled))
    }

    pub fn set_all_types(&mut self, enabled: bool) -> VisibilityReport {
        self.apply_filter_change(FilterChange::AllTypes(enabled))
    }

    pub fn set_definition_enabled(
        &mut self,
        kind: DefinitionKind,
        id: impl Into<DefId>,
        enabled: bool,
    ) -> VisibilityReport {
        self.apply_filter_change(FilterChange::Definition(kind, id.into(), enabled))
    }

    pub fn set_category_toggle(&mut self, enabled: bool) -> VisibilityReport {
        self.apply_filter_change(FilterChange::Category(enabled))
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> VisibilityReport {
        self.apply_filter_change(FilterChange::Query(query.into()))
    }

    pub fn reset_filters(&mut self) -> VisibilityReport {
        self.apply_filter_change(FilterChange::Reset)
    }

    fn backend(&self) -> Result<&Arc<dyn Backend>> {
        self.session
            .as_ref()
            .map(|s| &s.backend)
            .ok_or(Error::NotRunning)
    }

    fn write<T>(&self, action: &str, op: impl FnOnce(&dyn Backend) -> mapsync_core::Result<T>) -> Result<T> {
        let backend = self.backend()?;
        op(backend.as_ref()).map_err(|err| {
            warn!(action, error = %err, "write rejected");
            Error::from(err)
        })
    }

    // Writes below never touch local state; their effect arrives as the next
    // snapshot on the affected stream.

    /// Create or overwrite the marker at the draft's coordinates
    pub fn place_marker(&self, draft: MarkerDraft) -> Result<MarkerId> {
        draft.coords.validate()?;
        self.write("place marker", |b| b.upsert_marker_by_coords(draft))
    }

    /// Copy a registered marker to new coordinates
    ///
    /// The copy takes the marker as stored, so it keeps the definition
    /// reference rather than the merged definition fields.
    pub fn paste_marker(&self, source: &MarkerId, coords: Coords) -> Result<MarkerId> {
        coords.validate()?;
        let entry = self
            .registry
            .get(source)
            .ok_or_else(|| mapsync_core::Error::MarkerNotFound(source.to_string()))?;
        let draft = MarkerDraft::from_instance(entry.source()).at(coords);
        self.write("paste marker", |b| b.upsert_marker_by_coords(draft))
    }

    pub fn update_marker(&self, id: &MarkerId, patch: &ValueMap) -> Result<()> {
        self.write("update marker", |b| b.update_marker(id, patch))
    }

    pub fn delete_marker(&self, id: &MarkerId) -> Result<()> {
        self.write("delete marker", |b| b.delete_marker(id))
    }

    pub fn create_definition(&self, draft: DefinitionDraft) -> Result<DefId> {
        self.write("create definition", |b| b.create_definition(draft))
    }

    pub fn update_definition(&self, definition: &Definition) -> Result<()> {
        self.write("update definition", |b| b.update_definition(definition))
    }

    pub fn delete_definition(&self, kind: DefinitionKind, id: &DefId) -> Result<()> {
        self.write("delete definition", |b| b.delete_definition(kind, id))
    }

    /// Sidebar rows for one definition kind
    pub fn definition_rows(&self, kind: DefinitionKind) -> Vec<DefinitionRow> {
        self.filter.definition_rows(&self.cache, kind, &self.registry)
    }

    /// Search-as-you-type suggestions
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<String> {
        self.filter.suggestions(&self.registry, query, limit)
    }

    pub fn registry(&self) -> &MarkerRegistry<R::Handle> {
        &self.registry
    }

    pub fn cache(&self) -> &DefinitionCache {
        &self.cache
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

impl<R: Renderer + std::fmt::Debug> std::fmt::Debug for SyncCoordinator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("running", &self.session.is_some())
            .field("markers", &self.registry.len())
            .field("filter", self.filter.state())
            .field("renderer", &self.renderer)
            .finish()
    }
}
