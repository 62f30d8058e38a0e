//! Mapsync Core - Shared data model for live map markers
//!
//! This crate provides the types every other mapsync crate speaks:
//! - Identity types (`DefId`, `MarkerId`, `DefinitionKind`, `MarkerType`)
//! - Dynamic document values (`Value`, `ValueMap`)
//! - Definitions (Item, Chest, NPC templates) and their kind-specific traits
//! - Marker instances placed on the map, drafts and partial-field patches
//! - Store contracts for the remote document collections (`DefinitionStore`,
//!   `MarkerStore`) and the full-snapshot subscriptions they expose
//!
//! ## Snapshots, not deltas
//!
//! Every live subscription delivers the *entire* current collection on each
//! change, tagged with a per-stream sequence number. Consumers replace their
//! view wholesale and never merge, which removes diff races by construction.

mod coords;
mod definition;
mod error;
mod identity;
mod marker;
pub mod store;
mod value;

pub use coords::Coords;
pub use definition::{
    ChestSize, Definition, DefinitionDraft, Details, Disposition, ExtraLine, LootEntry, Rarity,
    Traits,
};
pub use error::{Error, Result};
pub use identity::{DefId, DefinitionKind, MarkerId, MarkerType};
pub use marker::{MarkerDraft, MarkerInstance};
pub use store::{
    Backend, DefinitionStore, MarkerStore, Snapshot, SnapshotSink, StreamResult, Subscription,
};
pub use value::{Value, ValueMap};
