//! Theme color scheme and color resolution.

use crate::xml::Element;
use deck_core::{Result, Rgb};
use std::collections::HashMap;

/// Color map aliases used when a slide references a mapped slot the theme
/// does not define directly.
const DEFAULT_COLOR_MAP: &[(&str, &str)] = &[
    ("bg1", "lt1"),
    ("tx1", "dk1"),
    ("bg2", "lt2"),
    ("tx2", "dk2"),
];

/// Named theme slot to RGB mapping shared by all slides.
#[derive(Debug, Clone, Default)]
pub struct ThemeColors {
    slots: HashMap<String, Rgb>,
}

impl ThemeColors {
    /// An empty scheme: every scheme reference resolves to no color.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `a:clrScheme` of a theme part.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        let mut colors = Self::new();
        let Some(scheme) = root.path(&["themeElements", "clrScheme"]) else {
            return Ok(colors);
        };

        for slot in &scheme.children {
            let value = slot
                .child("srgbClr")
                .and_then(|c| c.attr("val"))
                .or_else(|| slot.child("sysClr").and_then(|c| c.attr("lastClr")));
            match value.and_then(Rgb::from_hex) {
                Some(rgb) => colors.insert(&slot.name, rgb),
                None => log::debug!("Theme slot '{}' has no usable color", slot.name),
            }
        }

        Ok(colors)
    }

    pub fn insert(&mut self, slot: &str, color: Rgb) {
        self.slots.insert(slot.to_string(), color);
    }

    /// Look up a slot, falling back to the default color map aliases.
    pub fn get(&self, slot: &str) -> Option<Rgb> {
        self.slots.get(slot).copied().or_else(|| {
            DEFAULT_COLOR_MAP
                .iter()
                .find(|(alias, _)| *alias == slot)
                .and_then(|(_, target)| self.slots.get(*target).copied())
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolve a color node (`a:srgbClr` or `a:schemeClr`) held directly by
    /// `container`. Returns `None` when there is nothing resolvable.
    pub fn resolve(&self, container: &Element) -> Option<Rgb> {
        if let Some(val) = container.child("srgbClr").and_then(|c| c.attr("val")) {
            return Rgb::from_hex(val);
        }

        let scheme = container.child("schemeClr")?;
        let slot = scheme.attr("val")?;
        let Some(mut color) = self.get(slot) else {
            log::debug!("Unresolved scheme color '{}'", slot);
            return None;
        };
        if let Some(tint) = scheme.child("tint").and_then(|t| t.attr_i64("val")) {
            color = color.tint(tint);
        }
        if let Some(shade) = scheme.child("shade").and_then(|s| s.attr_i64("val")) {
            color = color.shade(shade);
        }
        Some(color)
    }

    /// Resolve the solid fill of a properties node (`spPr`, `ln`, `rPr`,
    /// `uFill`). An explicit `a:noFill` yields `None`.
    pub fn solid_fill(&self, properties: &Element) -> Option<Rgb> {
        if properties.child("noFill").is_some() {
            return None;
        }
        match properties.child("solidFill") {
            Some(fill) => self.resolve(fill),
            None => self.resolve(properties),
        }
    }
}
