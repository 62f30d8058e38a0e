//! Database models for persistent storage.

mod definition;
mod marker;

pub use definition::*;
pub use marker::*;
