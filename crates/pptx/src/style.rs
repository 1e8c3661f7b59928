//! Run property inheritance.
//!
//! Each level of the chain (built-in default, list style level 1, paragraph
//! default, run) contributes only the fields it sets. Fields are resolved
//! independently, so a run can override the size and still inherit color.

use crate::theme::ThemeColors;
use crate::xml::Element;
use deck_core::units::{emu_to_px, pt_to_px};
use deck_core::{Rgb, RunStyle, TextOutline, UnderlineKind};

/// Built-in font size in points.
pub const DEFAULT_FONT_SIZE_PT: f32 = 18.0;

/// Partially specified run properties from one level of the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunProperties {
    pub size_pt: Option<f32>,
    pub color: Option<Rgb>,
    pub underline: Option<UnderlineKind>,
    /// Underline color from `a:uFill`, else from this level's fill.
    pub underline_color: Option<Rgb>,
    pub strike: Option<bool>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub outline: Option<TextOutline>,
}

impl RunProperties {
    /// The fixed base of every chain.
    pub fn builtin() -> Self {
        Self {
            size_pt: Some(DEFAULT_FONT_SIZE_PT),
            color: Some(Rgb::DEFAULT_TEXT),
            underline: Some(UnderlineKind::None),
            underline_color: None,
            strike: Some(false),
            bold: Some(false),
            italic: Some(false),
            outline: None,
        }
    }

    /// Read an `a:rPr` or `a:defRPr` element.
    pub fn from_element(node: &Element, theme: &ThemeColors, scale: f32) -> Self {
        let color = node.child("solidFill").and_then(|fill| theme.resolve(fill));
        let underline_color = node
            .child("uFill")
            .and_then(|fill| theme.solid_fill(fill))
            .or(color);

        Self {
            size_pt: node.attr_i64("sz").map(|sz| sz as f32 / 100.0),
            color,
            underline: node.attr("u").and_then(UnderlineKind::from_ooxml),
            underline_color,
            strike: node.attr("strike").and_then(parse_strike),
            bold: node.attr("b").and_then(parse_bool),
            italic: node.attr("i").and_then(parse_bool),
            outline: node.child("ln").and_then(|ln| {
                let color = theme.solid_fill(ln)?;
                let width = emu_to_px(ln.attr_i64("w").unwrap_or(0), scale).max(1.0);
                Some(TextOutline { color, width })
            }),
        }
    }

    /// Read an optional element, treating absence as an empty level.
    pub fn from_optional(node: Option<&Element>, theme: &ThemeColors, scale: f32) -> Self {
        node.map(|n| Self::from_element(n, theme, scale))
            .unwrap_or_default()
    }

    /// Layer `top` over `self`; fields `top` sets win.
    pub fn overlay(&self, top: &RunProperties) -> RunProperties {
        RunProperties {
            size_pt: top.size_pt.or(self.size_pt),
            color: top.color.or(self.color),
            underline: top.underline.or(self.underline),
            underline_color: top.underline_color.or(self.underline_color),
            strike: top.strike.or(self.strike),
            bold: top.bold.or(self.bold),
            italic: top.italic.or(self.italic),
            outline: top.outline.or(self.outline),
        }
    }

    /// Produce a concrete style. Missing fields take built-in values.
    pub fn resolve(&self, scale: f32) -> RunStyle {
        let color = self.color.unwrap_or(Rgb::DEFAULT_TEXT);
        RunStyle {
            font_size: pt_to_px(self.size_pt.unwrap_or(DEFAULT_FONT_SIZE_PT), scale),
            color,
            underline: self.underline.unwrap_or_default(),
            underline_color: self.underline_color.unwrap_or(color),
            strike: self.strike.unwrap_or(false),
            strike_color: color,
            bold: self.bold.unwrap_or(false),
            italic: self.italic.unwrap_or(false),
            outline: self.outline,
        }
    }
}

fn parse_strike(value: &str) -> Option<bool> {
    match value {
        "sngStrike" | "dblStrike" => Some(true),
        "noStrike" => Some(false),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
