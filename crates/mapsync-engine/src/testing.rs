//! Test doubles for the canvas and the backend

use crate::render::{Icon, RenderError, Renderer};
use mapsync_core::{
    Coords, DefId, Definition, DefinitionDraft, DefinitionKind, DefinitionStore, Disposition,
    Error, MarkerDraft, MarkerId, MarkerInstance, MarkerStore, MarkerType, Rarity, Result,
    Snapshot, SnapshotSink, Subscription, Traits, ValueMap,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// What the recording canvas currently shows for a handle
#[derive(Debug, Clone)]
pub(crate) struct Visual {
    pub marker: MarkerId,
    pub icon: Icon,
    pub popup: String,
}

/// Canvas double that records every call
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    next_handle: u64,
    pub live: HashMap<u64, Visual>,
    pub groups: HashSet<(u64, MarkerType)>,
    pub destroyed: Vec<u64>,
    pub broken_images: HashSet<String>,
    pub fail_placeholder: bool,
    pub group_mutations: usize,
    pub icon_updates: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, icon: &Icon) -> std::result::Result<(), RenderError> {
        if icon.placeholder && self.fail_placeholder {
            return Err(RenderError::Layout("placeholder refused".into()));
        }
        match &icon.image {
            Some(url) if self.broken_images.contains(url) => Err(RenderError::Image(url.clone())),
            _ => Ok(()),
        }
    }

    pub fn handle_of(&self, id: &str) -> Option<u64> {
        self.live
            .iter()
            .find(|(_, v)| v.marker.as_str() == id)
            .map(|(h, _)| *h)
    }

    pub fn visible(&self, id: &str) -> bool {
        self.handle_of(id)
            .is_some_and(|h| self.groups.iter().any(|(gh, _)| *gh == h))
    }
}

impl Renderer for RecordingRenderer {
    type Handle = u64;

    fn create_visual(
        &mut self,
        data: &MarkerInstance,
        icon: &Icon,
    ) -> std::result::Result<u64, RenderError> {
        self.check(icon)?;
        self.next_handle += 1;
        self.live.insert(
            self.next_handle,
            Visual {
                marker: data.id.clone(),
                icon: icon.clone(),
                popup: String::new(),
            },
        );
        Ok(self.next_handle)
    }

    fn update_icon(
        &mut self,
        handle: &u64,
        _data: &MarkerInstance,
        icon: &Icon,
    ) -> std::result::Result<(), RenderError> {
        self.check(icon)?;
        let visual = self.live.get_mut(handle).ok_or(RenderError::UnknownHandle)?;
        visual.icon = icon.clone();
        self.icon_updates += 1;
        Ok(())
    }

    fn update_popup(&mut self, handle: &u64, html: &str) -> std::result::Result<(), RenderError> {
        let visual = self.live.get_mut(handle).ok_or(RenderError::UnknownHandle)?;
        visual.popup = html.to_string();
        Ok(())
    }

    fn destroy(&mut self, handle: u64) {
        self.live.remove(&handle);
        self.groups.retain(|(h, _)| *h != handle);
        self.destroyed.push(handle);
    }

    fn add_to_group(&mut self, handle: &u64, group: MarkerType) {
        self.groups.insert((*handle, group));
        self.group_mutations += 1;
    }

    fn remove_from_group(&mut self, handle: &u64, group: MarkerType) {
        self.groups.remove(&(*handle, group));
        self.group_mutations += 1;
    }

    fn has_membership(&self, handle: &u64, group: MarkerType) -> bool {
        self.groups.contains(&(*handle, group))
    }
}

enum ScriptedSink {
    Markers(SnapshotSink<MarkerInstance>),
    Definitions(DefinitionKind, SnapshotSink<Definition>),
}

/// Backend double whose streams are driven by the test
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    sinks: Arc<Mutex<Vec<(u64, ScriptedSink)>>>,
    next_sub: AtomicU64,
    pub writes: Mutex<Vec<String>>,
    pub fail_writes: AtomicBool,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }

    pub fn push_markers(&self, seq: u64, records: Vec<MarkerInstance>) {
        for (_, sink) in self.sinks.lock().unwrap().iter() {
            if let ScriptedSink::Markers(sink) = sink {
                sink(Ok(Snapshot::new(seq, records.clone())));
            }
        }
    }

    pub fn push_definitions(&self, kind: DefinitionKind, seq: u64, defs: Vec<Definition>) {
        for (_, sink) in self.sinks.lock().unwrap().iter() {
            if let ScriptedSink::Definitions(k, sink) = sink {
                if *k == kind {
                    sink(Ok(Snapshot::new(seq, defs.clone())));
                }
            }
        }
    }

    pub fn fail_markers(&self, reason: &str) {
        for (_, sink) in self.sinks.lock().unwrap().iter() {
            if let ScriptedSink::Markers(sink) = sink {
                sink(Err(Error::SubscriptionFailed(reason.to_string())));
            }
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn record(&self, write: String) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Store(format!("rejected: {write}")));
        }
        self.writes.lock().unwrap().push(write);
        Ok(())
    }

    fn add_sink(&self, sink: ScriptedSink) -> Subscription {
        let id = self.next_sub.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().unwrap().push((id, sink));
        let sinks = Arc::clone(&self.sinks);
        Subscription::new(move || {
            sinks.lock().unwrap().retain(|(sid, _)| *sid != id);
        })
    }
}

impl DefinitionStore for ScriptedBackend {
    fn load_definitions(&self, _kind: DefinitionKind) -> Result<Vec<Definition>> {
        Ok(Vec::new())
    }

    fn create_definition(&self, draft: DefinitionDraft) -> Result<DefId> {
        self.record(format!("create {}", draft.details.name))?;
        Ok(DefId::new("new-1"))
    }

    fn update_definition(&self, definition: &Definition) -> Result<()> {
        self.record(format!("update {}", definition.id))
    }

    fn delete_definition(&self, kind: DefinitionKind, id: &DefId) -> Result<()> {
        self.record(format!("delete {kind}/{id}"))
    }

    fn subscribe_definitions(
        &self,
        kind: DefinitionKind,
        sink: SnapshotSink<Definition>,
    ) -> Result<Subscription> {
        Ok(self.add_sink(ScriptedSink::Definitions(kind, sink)))
    }
}

impl MarkerStore for ScriptedBackend {
    fn load_markers(&self) -> Result<Vec<MarkerInstance>> {
        Ok(Vec::new())
    }

    fn upsert_marker_by_coords(&self, draft: MarkerDraft) -> Result<MarkerId> {
        let id = draft.coords.marker_id();
        self.record(format!("upsert {id}"))?;
        Ok(id)
    }

    fn update_marker(&self, id: &MarkerId, _patch: &ValueMap) -> Result<()> {
        self.record(format!("patch {id}"))
    }

    fn delete_marker(&self, id: &MarkerId) -> Result<()> {
        self.record(format!("delete {id}"))
    }

    fn subscribe_markers(&self, sink: SnapshotSink<MarkerInstance>) -> Result<Subscription> {
        Ok(self.add_sink(ScriptedSink::Markers(sink)))
    }
}

pub(crate) fn item_def(id: &str, name: &str) -> Definition {
    Definition::new(
        id,
        name,
        Traits::Item {
            rarity: Rarity::Common,
            item_type: "Misc".into(),
        },
    )
}

pub(crate) fn npc_def(id: &str, name: &str, disposition: Disposition) -> Definition {
    Definition::new(
        id,
        name,
        Traits::Npc {
            disposition,
            tier: 1,
            loot_pool: Vec::new(),
        },
    )
}

pub(crate) fn item_marker(id: &str, def: &str) -> MarkerInstance {
    MarkerInstance::new(id, MarkerType::Item, Coords::new(1.0, 1.0), "inline").with_definition(def)
}

pub(crate) fn npc_marker(id: &str, def: &str) -> MarkerInstance {
    MarkerInstance::new(id, MarkerType::Npc, Coords::new(2.0, 2.0), "inline").with_definition(def)
}

pub(crate) fn door(id: &str, name: &str) -> MarkerInstance {
    MarkerInstance::new(id, MarkerType::Door, Coords::new(3.0, 3.0), name)
}
