//! Visibility filtering
//!
//! A marker is visible when every gate passes:
//!
//! - **Type**: its type toggle is on
//! - **Category**: the category toggle is on, or the marker is outside the
//!   category (see [`KindSpec::category`](crate::KindSpec))
//! - **Definition**: the toggle for its referenced definition is not
//!   explicitly off
//! - **Listing**: with `hide_unlisted`, its definition is shown in filters
//! - **Query**: its name contains the search text, ignoring case
//!
//! Missing toggles default to visible.

use crate::cache::DefinitionCache;
use crate::config::FilterConfig;
use crate::kinds;
use crate::registry::MarkerRegistry;
use crate::render::Renderer;
use mapsync_core::{DefId, DefinitionKind, MarkerInstance, MarkerType};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The user's current filter input
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    type_enabled: HashMap<MarkerType, bool>,
    definition_enabled: HashMap<(DefinitionKind, DefId), bool>,
    category_toggle: bool,
    query: String,
}

impl FilterState {
    /// Initial state described by a config
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            type_enabled: config.default_types.clone(),
            definition_enabled: HashMap::new(),
            category_toggle: config.category_toggle,
            query: String::new(),
        }
    }

    pub fn type_enabled(&self, marker_type: MarkerType) -> bool {
        self.type_enabled.get(&marker_type).copied().unwrap_or(true)
    }

    pub fn definition_enabled(&self, kind: DefinitionKind, id: &DefId) -> bool {
        self.definition_enabled
            .get(&(kind, id.clone()))
            .copied()
            .unwrap_or(true)
    }

    pub fn category_toggle(&self) -> bool {
        self.category_toggle
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Toggle one marker type. Returns whether anything changed.
    pub fn set_type_enabled(&mut self, marker_type: MarkerType, enabled: bool) -> bool {
        let before = self.type_enabled(marker_type);
        self.type_enabled.insert(marker_type, enabled);
        before != enabled
    }

    /// Toggle every marker type at once
    pub fn set_all_types(&mut self, enabled: bool) -> bool {
        let mut changed = false;
        for ty in MarkerType::ALL {
            changed |= self.set_type_enabled(ty, enabled);
        }
        changed
    }

    /// Toggle one definition
    pub fn set_definition_enabled(&mut self, kind: DefinitionKind, id: DefId, enabled: bool) -> bool {
        self.definition_enabled.insert((kind, id), enabled).unwrap_or(true) != enabled
    }

    /// Set the search text. Stored trimmed and lowercased.
    pub fn set_query(&mut self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if self.query == query {
            return false;
        }
        self.query = query;
        true
    }

    pub fn set_category_toggle(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.category_toggle, enabled) != enabled
    }
}

/// Outcome of one visibility pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityReport {
    pub shown: usize,
    pub hidden: usize,
    /// Group additions actually performed
    pub added: usize,
    /// Group removals actually performed
    pub removed: usize,
}

impl VisibilityReport {
    /// Whether the pass changed anything on the canvas
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// One sidebar row for a definition
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRow {
    pub kind: DefinitionKind,
    pub id: DefId,
    pub name: String,
    pub enabled: bool,
    /// Number of placed markers referencing this definition
    pub markers: usize,
}

/// Decides which registered markers are in their visible group
#[derive(Debug, Clone)]
pub struct FilterEngine {
    state: FilterState,
    config: FilterConfig,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            state: FilterState::from_config(&config),
            config,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FilterState {
        &mut self.state
    }

    /// Return to the configured initial state
    pub fn reset(&mut self) -> bool {
        let fresh = FilterState::from_config(&self.config);
        if fresh == self.state {
            return false;
        }
        self.state = fresh;
        true
    }

    /// Whether render-ready data passes every gate
    pub fn is_visible(&self, data: &MarkerInstance) -> bool {
        let state = &self.state;
        if !state.type_enabled(data.marker_type) {
            return false;
        }
        if !state.category_toggle && kinds::spec(data.marker_type).in_category(data) {
            return false;
        }
        if let Some((kind, id)) = data.definition_key() {
            if !state.definition_enabled(kind, id) {
                return false;
            }
        }
        if self.config.hide_unlisted && !data.show_in_filters {
            return false;
        }
        matches_query(data.name(), &state.query)
    }

    /// Move every registered marker into or out of its visible group
    ///
    /// Group membership is checked before each mutation, so a second pass
    /// over unchanged state performs none.
    pub fn apply_all<R: Renderer>(
        &self,
        registry: &MarkerRegistry<R::Handle>,
        renderer: &mut R,
    ) -> VisibilityReport {
        let mut report = VisibilityReport::default();
        for entry in registry.all() {
            let group = entry.data().marker_type;
            let member = renderer.has_membership(entry.handle(), group);
            if self.is_visible(entry.data()) {
                report.shown += 1;
                if !member {
                    renderer.add_to_group(entry.handle(), group);
                    report.added += 1;
                }
            } else {
                report.hidden += 1;
                if member {
                    renderer.remove_from_group(entry.handle(), group);
                    report.removed += 1;
                }
            }
        }
        debug!(
            shown = report.shown,
            hidden = report.hidden,
            added = report.added,
            removed = report.removed,
            "visibility applied"
        );
        report
    }

    /// Sidebar rows for the listed definitions of one kind
    pub fn definition_rows<H: Clone + std::fmt::Debug>(
        &self,
        cache: &DefinitionCache,
        kind: DefinitionKind,
        registry: &MarkerRegistry<H>,
    ) -> Vec<DefinitionRow> {
        let mut counts: HashMap<&DefId, usize> = HashMap::new();
        for entry in registry.all() {
            if let Some((k, id)) = entry.source().definition_key() {
                if k == kind {
                    *counts.entry(id).or_default() += 1;
                }
            }
        }
        cache
            .all(kind)
            .filter(|def| def.show_in_filters)
            .map(|def| DefinitionRow {
                kind,
                id: def.id.clone(),
                name: def.name().to_string(),
                enabled: self.state.definition_enabled(kind, &def.id),
                markers: counts.get(&def.id).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Distinct marker names matching `query`, in registry order
    pub fn suggestions<H: Clone + std::fmt::Debug>(
        &self,
        registry: &MarkerRegistry<H>,
        query: &str,
        limit: usize,
    ) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        registry
            .all()
            .map(|entry| entry.data().name())
            .filter(|name| !name.is_empty() && matches_query(name, &query))
            .filter(|name| seen.insert(name.to_string()))
            .take(limit)
            .map(str::to_string)
            .collect()
    }
}

/// `query` is already lowercased
fn matches_query(name: &str, query: &str) -> bool {
    query.is_empty() || name.to_lowercase().contains(query)
}
