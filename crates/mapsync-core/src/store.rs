//! Contracts for the remote document collections
//!
//! These traits define what the synchronization engine needs from a
//! document store. Backends implement them for their storage of choice;
//! `mapsync-db` ships one on top of native_db.
//!
//! Writes never feed back into a caller's local state directly: the result
//! of every successful write shows up as the next snapshot on the affected
//! stream.

use crate::{
    DefId, Definition, DefinitionDraft, DefinitionKind, MarkerDraft, MarkerId, MarkerInstance,
    Result, ValueMap,
};
use std::fmt;
use std::sync::Arc;

/// The full, replacing contents of a collection at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Monotonically increasing per stream; later snapshots supersede earlier ones
    pub seq: u64,
    /// Every record currently in the collection
    pub records: Vec<T>,
}

impl<T> Snapshot<T> {
    pub fn new(seq: u64, records: Vec<T>) -> Self {
        Self { seq, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What a live stream delivers: a snapshot, or the reason the stream failed
pub type StreamResult<T> = Result<Snapshot<T>>;

/// Callback invoked on every stream delivery
///
/// Sinks may be invoked from any thread and must not call back into the store
/// that is delivering to them.
pub type SnapshotSink<T> = Arc<dyn Fn(StreamResult<T>) + Send + Sync>;

/// Handle to a live subscription
///
/// Dropping the handle unsubscribes, as does calling [`Subscription::unsubscribe`].
/// After either, the sink receives no further deliveries.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` once when it ends
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving deliveries
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The Item, Chest and NPC definition collections
pub trait DefinitionStore: Send + Sync {
    /// One-shot read of a whole collection
    fn load_definitions(&self, kind: DefinitionKind) -> Result<Vec<Definition>>;

    /// Create a definition; the store assigns and returns its id
    fn create_definition(&self, draft: DefinitionDraft) -> Result<DefId>;

    /// Replace an existing definition (matched by kind and id)
    fn update_definition(&self, definition: &Definition) -> Result<()>;

    /// Delete a definition; referencing markers are left untouched
    fn delete_definition(&self, kind: DefinitionKind, id: &DefId) -> Result<()>;

    /// Subscribe to a collection
    ///
    /// The sink receives the current snapshot right away and a new full
    /// snapshot after every change.
    fn subscribe_definitions(
        &self,
        kind: DefinitionKind,
        sink: SnapshotSink<Definition>,
    ) -> Result<Subscription>;
}

/// The marker collection
pub trait MarkerStore: Send + Sync {
    /// One-shot read of every marker
    fn load_markers(&self) -> Result<Vec<MarkerInstance>>;

    /// Insert or overwrite the marker keyed by the draft's coordinates
    fn upsert_marker_by_coords(&self, draft: MarkerDraft) -> Result<MarkerId>;

    /// Apply a partial-field patch to an existing marker
    fn update_marker(&self, id: &MarkerId, patch: &ValueMap) -> Result<()>;

    /// Delete a marker
    fn delete_marker(&self, id: &MarkerId) -> Result<()>;

    /// Subscribe to the marker collection, same delivery rules as definitions
    fn subscribe_markers(&self, sink: SnapshotSink<MarkerInstance>) -> Result<Subscription>;
}

/// A store serving both marker and definition collections
pub trait Backend: DefinitionStore + MarkerStore {}

impl<T: DefinitionStore + MarkerStore> Backend for T {}
