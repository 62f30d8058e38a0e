//! Mapsync DB - Marker and definition store using native_db
//!
//! Provides:
//! - Persistent (or in-memory) Item, Chest and NPC definition collections
//! - The marker collection, keyed by coordinate-derived ids
//! - Live feeds that redeliver a full, sequence-numbered snapshot after
//!   every committed write
//! - A RON seed loader for fixtures and demos

mod error;
mod feeds;
mod models;
mod queries;
mod seed;
mod store;

pub use error::{Error, Result};
pub use seed::{Seed, SeedReport};
pub use store::Store;
