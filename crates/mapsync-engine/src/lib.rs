//! Mapsync Engine - Live marker synchronization and visibility
//!
//! Keeps the markers drawn on a map canvas consistent with three independent
//! streams of change: marker snapshots, definition snapshots, and the user's
//! filter and search input.
//!
//! ## Architecture
//!
//! ```text
//! Backend streams ──▶ SyncCoordinator inbox
//!                          │
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//!  DefinitionCache   MarkerRegistry ◀── enrich()
//!                          │
//!                          ▼
//!                    FilterEngine ──▶ Renderer groups
//! ```
//!
//! ## Key Components
//!
//! - [`DefinitionCache`]: current definitions per kind, replaced wholesale
//! - [`enrich`]: pure merge of a marker with its live definition
//! - [`MarkerRegistry`]: reconciles snapshots into visual handles
//! - [`FilterEngine`]: AND of type, category, definition and query gates
//! - [`SyncCoordinator`]: owns all of the above and routes stream events
//!
//! ## Design Principles
//!
//! 1. **Snapshots replace, never merge** - every stream redelivers its whole set
//! 2. **No optimistic writes** - local state only changes when a snapshot arrives
//! 3. **Only the registry touches visuals** - handles are opaque elsewhere

mod cache;
pub mod config;
mod coordinator;
mod enrich;
mod error;
mod filter;
pub mod kinds;
mod popup;
mod registry;
mod render;
mod sequence;

#[cfg(test)]
mod testing;

pub use cache::DefinitionCache;
pub use config::{FilterConfig, RenderConfig, SyncConfig};
pub use coordinator::{FilterChange, SyncCoordinator, SyncEvent};
pub use enrich::enrich;
pub use error::{Error, Result};
pub use filter::{DefinitionRow, FilterEngine, FilterState, VisibilityReport};
pub use kinds::KindSpec;
pub use popup::render_popup;
pub use registry::{MarkerRegistry, RegistryEntry, SyncStats};
pub use render::{Icon, RenderError, Renderer};
pub use sequence::{SequenceGuard, StreamKey};
