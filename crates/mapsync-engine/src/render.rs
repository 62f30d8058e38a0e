//! Contract for the map canvas widget
//!
//! The canvas lives outside this crate. Implementations wrap whatever widget
//! draws markers; only [`MarkerRegistry`](crate::MarkerRegistry) and
//! [`FilterEngine`](crate::FilterEngine) ever call into them.

use crate::config::RenderConfig;
use mapsync_core::{MarkerInstance, MarkerType};
use std::fmt;
use thiserror::Error;

/// What the canvas should draw for a marker
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    /// Image URL, when the marker has one
    pub image: Option<String>,
    /// Short text glyph drawn when there is no image
    pub glyph: String,
    /// Tint or border color
    pub color: String,
    /// Edge length in pixels
    pub size: u32,
    /// Whether this is the fallback for a failed render
    pub placeholder: bool,
}

impl Icon {
    /// Default icon edge length
    pub const DEFAULT_SIZE: u32 = 24;

    /// The icon drawn when a marker's own icon fails
    pub fn placeholder(config: &RenderConfig) -> Self {
        Self {
            image: config.placeholder_image.clone(),
            glyph: "?".to_string(),
            color: config.placeholder_color.clone(),
            size: Self::DEFAULT_SIZE,
            placeholder: true,
        }
    }
}

/// Failure reported by the canvas for a single marker
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("image failed to load: {0}")]
    Image(String),

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("unknown visual handle")]
    UnknownHandle,
}

/// The canvas operations the engine consumes
///
/// `Handle` is opaque to the engine; it is created, mutated and destroyed
/// only through these calls. Groups are keyed by marker type and represent
/// the currently visible layer for that type.
pub trait Renderer {
    type Handle: Clone + fmt::Debug;

    /// Create the on-canvas representation of a marker
    fn create_visual(
        &mut self,
        data: &MarkerInstance,
        icon: &Icon,
    ) -> Result<Self::Handle, RenderError>;

    /// Redraw a marker's icon in place
    fn update_icon(
        &mut self,
        handle: &Self::Handle,
        data: &MarkerInstance,
        icon: &Icon,
    ) -> Result<(), RenderError>;

    /// Replace a marker's popup content
    fn update_popup(&mut self, handle: &Self::Handle, html: &str) -> Result<(), RenderError>;

    /// Remove a marker from the canvas for good
    fn destroy(&mut self, handle: Self::Handle);

    /// Show a marker in its type's visible group
    fn add_to_group(&mut self, handle: &Self::Handle, group: MarkerType);

    /// Hide a marker from its type's visible group
    fn remove_from_group(&mut self, handle: &Self::Handle, group: MarkerType);

    /// Whether the marker is currently in the group
    fn has_membership(&self, handle: &Self::Handle, group: MarkerType) -> bool;
}
