//! RON configuration for the synchronization engine
//!
//! Every field has a default, so an empty `()` document is a valid config.
//!
//! ```
//! use mapsync_core::MarkerType;
//! use mapsync_engine::SyncConfig;
//!
//! let config = SyncConfig::from_ron_str(
//!     "(filter: (default_types: {Door: false}, hide_unlisted: true))",
//! )
//! .unwrap();
//! assert!(!config.filter.type_enabled(MarkerType::Door));
//! assert!(config.filter.type_enabled(MarkerType::Item));
//! assert!(config.filter.hide_unlisted);
//! ```

use crate::error::Result;
use mapsync_core::MarkerType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Initial filter state
    #[serde(default)]
    pub filter: FilterConfig,
    /// Rendering fallbacks
    #[serde(default)]
    pub render: RenderConfig,
}

/// Initial sidebar filter state, also what an explicit reset returns to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Per-type toggles; types not listed start enabled
    #[serde(default)]
    pub default_types: HashMap<MarkerType, bool>,
    /// Whether non-hostile NPCs start visible
    #[serde(default = "default_true")]
    pub category_toggle: bool,
    /// Hide markers whose definition has `show_in_filters: false`
    #[serde(default)]
    pub hide_unlisted: bool,
}

impl FilterConfig {
    /// Initial toggle for a marker type
    pub fn type_enabled(&self, marker_type: MarkerType) -> bool {
        self.default_types.get(&marker_type).copied().unwrap_or(true)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_types: HashMap::new(),
            category_toggle: true,
            hide_unlisted: false,
        }
    }
}

/// Fallbacks used when a marker's own assets cannot be rendered
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Image shown in place of a broken icon
    #[serde(default)]
    pub placeholder_image: Option<String>,
    /// Color of the placeholder icon
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            placeholder_image: None,
            placeholder_color: default_placeholder_color(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_placeholder_color() -> String {
    "#ff00ff".to_string()
}

impl SyncConfig {
    /// Parse a config from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Load a config from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }
}
