//! Per-stream ordering guard
//!
//! Snapshots can arrive out of emission order. A snapshot is applied only if
//! its sequence number is higher than the last one applied on the same
//! stream; anything older (or a redelivery) is discarded.

use mapsync_core::DefinitionKind;
use std::collections::HashMap;
use std::fmt;

/// Identifies one live stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKey {
    Markers,
    Definitions(DefinitionKind),
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKey::Markers => write!(f, "markers"),
            StreamKey::Definitions(kind) => write!(f, "definitions/{}", kind),
        }
    }
}

/// Remembers the last applied sequence number per stream
#[derive(Debug, Clone, Default)]
pub struct SequenceGuard {
    applied: HashMap<StreamKey, u64>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `seq` for `stream` if it supersedes what was applied before
    ///
    /// Returns false when the snapshot is stale and must be dropped.
    pub fn accept(&mut self, stream: StreamKey, seq: u64) -> bool {
        match self.applied.get(&stream) {
            Some(&last) if seq <= last => false,
            _ => {
                self.applied.insert(stream, seq);
                true
            }
        }
    }

    /// Last sequence number applied on a stream
    pub fn last_applied(&self, stream: StreamKey) -> Option<u64> {
        self.applied.get(&stream).copied()
    }

    /// Forget every stream, used when a session restarts with fresh subscriptions
    pub fn reset(&mut self) {
        self.applied.clear();
    }
}
