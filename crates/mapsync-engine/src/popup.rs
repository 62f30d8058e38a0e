//! Popup HTML for a render-ready marker

use crate::cache::DefinitionCache;
use crate::kinds;
use mapsync_core::{DefinitionKind, LootEntry, MarkerInstance};
use std::fmt::Write;

/// Build the popup body shown when a marker is clicked
///
/// All text taken from documents is escaped; only colors pass through, and
/// only when they look like a hex color. Loot references are shown by the
/// name of the cached item definition, or by id when it is not cached.
pub fn render_popup(data: &MarkerInstance, cache: &DefinitionCache) -> String {
    let spec = kinds::spec(data.marker_type);
    let mut html = String::from("<div class=\"marker-popup\">");

    let name = if data.details.name.is_empty() {
        spec.label
    } else {
        data.details.name.as_str()
    };
    let _ = write!(html, "<h3>{}</h3>", escape(name));

    match (spec.popup_subtitle)(data) {
        Some(subtitle) => {
            let _ = write!(html, "<div class=\"kind\">{}</div>", escape(&subtitle));
        }
        None => {
            let _ = write!(html, "<div class=\"kind\">{}</div>", spec.label);
        }
    }

    if let Some(image) = &data.details.image_large {
        let _ = write!(html, "<img src=\"{}\" alt=\"\">", escape(image));
    }
    if !data.details.description.is_empty() {
        let _ = write!(html, "<p>{}</p>", escape(&data.details.description));
    }
    for line in &data.details.extra_lines {
        match line.color.as_deref().filter(|c| is_hex_color(c)) {
            Some(color) => {
                let _ = write!(
                    html,
                    "<div class=\"extra\" style=\"color:{}\">{}</div>",
                    color,
                    escape(&line.text)
                );
            }
            None => {
                let _ = write!(html, "<div class=\"extra\">{}</div>", escape(&line.text));
            }
        }
    }

    let loot = data
        .traits
        .as_ref()
        .map(|traits| traits.loot_pool())
        .unwrap_or(&[]);
    if !loot.is_empty() {
        html.push_str("<ul class=\"loot\">");
        for entry in loot {
            let _ = write!(html, "<li>{}</li>", escape(&loot_label(entry, cache)));
        }
        html.push_str("</ul>");
    }

    html.push_str("</div>");
    html
}

fn loot_label(entry: &LootEntry, cache: &DefinitionCache) -> String {
    let resolved = match entry {
        LootEntry::Ref(id) => cache
            .get(DefinitionKind::Item, id)
            .map(|def| def.details.name.as_str())
            .filter(|name| !name.is_empty()),
        LootEntry::Embedded(_) => None,
    };
    resolved.map_or_else(|| entry.label(), str::to_string)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_hex_color(color: &str) -> bool {
    color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
