//! Canvas that draws to stdout

use mapsync_core::{MarkerId, MarkerInstance, MarkerType};
use mapsync_engine::{Icon, RenderError, Renderer};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug)]
struct Drawn {
    marker: MarkerId,
    label: String,
    icon: Icon,
}

/// Keeps visuals in memory and prints a listing on request
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    next: u32,
    drawn: BTreeMap<u32, Drawn>,
    visible: HashSet<(u32, MarkerType)>,
}

impl ConsoleRenderer {
    pub fn print_visible(&self) {
        for (handle, drawn) in &self.drawn {
            let shown = self.visible.iter().any(|(h, _)| h == handle);
            let glyph = if drawn.icon.placeholder { "?" } else { drawn.icon.glyph.as_str() };
            println!(
                "  {} [{}] {:<24} {} {}",
                if shown { "●" } else { "○" },
                glyph,
                drawn.label,
                drawn.icon.color,
                drawn.marker
            );
        }
    }
}

fn check_image(icon: &Icon) -> Result<(), RenderError> {
    match &icon.image {
        Some(url) if !url.ends_with(".png") && !url.ends_with(".webp") => {
            Err(RenderError::Image(url.clone()))
        }
        _ => Ok(()),
    }
}

impl Renderer for ConsoleRenderer {
    type Handle = u32;

    fn create_visual(&mut self, data: &MarkerInstance, icon: &Icon) -> Result<u32, RenderError> {
        check_image(icon)?;
        self.next += 1;
        self.drawn.insert(
            self.next,
            Drawn {
                marker: data.id.clone(),
                label: data.name().to_string(),
                icon: icon.clone(),
            },
        );
        Ok(self.next)
    }

    fn update_icon(&mut self, handle: &u32, data: &MarkerInstance, icon: &Icon) -> Result<(), RenderError> {
        check_image(icon)?;
        let drawn = self.drawn.get_mut(handle).ok_or(RenderError::UnknownHandle)?;
        drawn.label = data.name().to_string();
        drawn.icon = icon.clone();
        Ok(())
    }

    fn update_popup(&mut self, handle: &u32, _html: &str) -> Result<(), RenderError> {
        self.drawn
            .contains_key(handle)
            .then_some(())
            .ok_or(RenderError::UnknownHandle)
    }

    fn destroy(&mut self, handle: u32) {
        self.drawn.remove(&handle);
        self.visible.retain(|(h, _)| *h != handle);
    }

    fn add_to_group(&mut self, handle: &u32, group: MarkerType) {
        self.visible.insert((*handle, group));
    }

    fn remove_from_group(&mut self, handle: &u32, group: MarkerType) {
        self.visible.remove(&(*handle, group));
    }

    fn has_membership(&self, handle: &u32, group: MarkerType) -> bool {
        self.visible.contains(&(*handle, group))
    }
}
