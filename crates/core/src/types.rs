//! Domain types for a parsed slide deck.
//!
//! Everything here is fully resolved: colors are concrete RGB values, font
//! sizes are in scaled pixels and no formatting field is left to inherit.

use crate::units::{emu_to_pt, emu_to_px};
use serde::{Deserialize, Serialize};

/// Default slide width (10 in).
pub const DEFAULT_SLIDE_WIDTH_EMU: i64 = 9_144_000;

/// Default slide height (7.5 in).
pub const DEFAULT_SLIDE_HEIGHT_EMU: i64 = 6_858_000;

/// Line height as a multiple of font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.25;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Default text color when nothing in the style chain sets one.
    pub const DEFAULT_TEXT: Rgb = Rgb::new(0x11, 0x11, 0x11);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a six digit hex color, with or without a leading `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Blend toward white. `amount` is in 1/100000 (100000 = white).
    pub fn tint(self, amount: i64) -> Self {
        let t = amount as f64 / 100_000.0;
        let blend = |v: u8| clamp_channel(v as f64 + (255.0 - v as f64) * t);
        Self::new(blend(self.r), blend(self.g), blend(self.b))
    }

    /// Blend toward black. `amount` is in 1/100000 (100000 = black).
    pub fn shade(self, amount: i64) -> Self {
        let s = amount as f64 / 100_000.0;
        let blend = |v: u8| clamp_channel(v as f64 * (1.0 - s));
        Self::new(blend(self.r), blend(self.g), blend(self.b))
    }
}

fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Declared slide size of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width_emu: i64,
    pub height_emu: i64,
}

impl Default for SlideSize {
    fn default() -> Self {
        Self {
            width_emu: DEFAULT_SLIDE_WIDTH_EMU,
            height_emu: DEFAULT_SLIDE_HEIGHT_EMU,
        }
    }
}

impl SlideSize {
    /// Page size in PDF points.
    pub fn to_points(&self) -> (f32, f32) {
        (emu_to_pt(self.width_emu), emu_to_pt(self.height_emu))
    }

    /// Surface size in whole pixels at the given scale.
    pub fn to_pixels(&self, scale: f32) -> (u32, u32) {
        let w = emu_to_px(self.width_emu, scale).round().max(0.0);
        let h = emu_to_px(self.height_emu, scale).round().max(0.0);
        (w as u32, h as u32)
    }
}

/// Position and size of a shape, in EMUs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Transform {
    /// Shapes with a non-positive extent are never drawn.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// The box in scaled pixels.
    pub fn to_px(&self, scale: f32) -> PxRect {
        PxRect {
            x: emu_to_px(self.x, scale),
            y: emu_to_px(self.y, scale),
            width: emu_to_px(self.width, scale),
            height: emu_to_px(self.height, scale),
        }
    }
}

/// A box in scaled pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PxRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PxRect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Preset geometry of an auto-shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Geometry {
    #[default]
    Rect,
    RoundRect,
    Ellipse,
}

impl Geometry {
    /// Map a `prst` value. Unknown presets draw as rectangles.
    pub fn from_preset(prst: &str) -> Self {
        match prst {
            "roundRect" => Self::RoundRect,
            "ellipse" => Self::Ellipse,
            _ => Self::Rect,
        }
    }
}

/// Stroke line join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Preset dash style of a stroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    DashDot,
    Dot,
    LongDash,
    LongDashDot,
    LongDashDotDot,
}

impl DashStyle {
    /// Map a `prstDash` value. Unknown styles are solid.
    pub fn from_preset(value: &str) -> Self {
        match value {
            "dash" => Self::Dash,
            "dashDot" => Self::DashDot,
            "dot" => Self::Dot,
            "lgDash" => Self::LongDash,
            "lgDashDot" => Self::LongDashDot,
            "lgDashDotDot" => Self::LongDashDotDot,
            _ => Self::Solid,
        }
    }

    /// Dash/gap lengths for a stroke of the given width. Empty means solid.
    pub fn pattern(&self, stroke_width: f32) -> Vec<f32> {
        let unit = stroke_width.max(1.0);
        let lengths: &[f32] = match self {
            Self::Solid => &[],
            Self::Dash => &[6.0, 4.0],
            Self::DashDot => &[6.0, 3.0, 1.0, 3.0],
            Self::Dot => &[1.0, 3.0],
            Self::LongDash => &[10.0, 6.0],
            Self::LongDashDot => &[10.0, 4.0, 2.0, 4.0],
            Self::LongDashDotDot => &[10.0, 4.0, 2.0, 4.0, 2.0, 4.0],
        };
        lengths.iter().map(|l| l * unit).collect()
    }
}

/// Outline stroke of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Rgb,
    /// Width in scaled pixels, at least 1.
    pub width: f32,
    pub dash: DashStyle,
    pub join: LineJoin,
}

/// A drawable element of a slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub transform: Transform,
    /// Rotation around the box center, in radians.
    pub rotation: f32,
    pub fill: Option<Rgb>,
    pub stroke: Option<Stroke>,
    pub kind: ShapeKind,
}

/// What a shape draws besides its common attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeKind {
    AutoShape {
        geometry: Geometry,
        text: Option<TextBody>,
    },
    Picture {
        rel_id: String,
        image: Vec<u8>,
    },
}

impl Shape {
    pub fn text_body(&self) -> Option<&TextBody> {
        match &self.kind {
            ShapeKind::AutoShape { text, .. } => text.as_ref(),
            ShapeKind::Picture { .. } => None,
        }
    }
}

/// Vertical anchoring of a text body inside its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    #[default]
    Top,
    Center,
    Bottom,
    /// Distribute lines so the content fills the box height.
    Justify,
}

/// Writing direction of a text body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    #[default]
    Horizontal,
    /// Characters run top to bottom; columns advance left to right.
    VerticalTopToBottom,
    /// Characters run top to bottom; columns advance right to left.
    VerticalRightToLeft,
}

impl FlowDirection {
    pub fn is_vertical(&self) -> bool {
        !matches!(self, Self::Horizontal)
    }
}

/// Text content of an auto-shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
    pub anchor: Anchor,
    pub flow: FlowDirection,
}

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    /// Laid out as left within a line.
    Justify,
}

/// A paragraph of runs with resolved spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub align: Alignment,
    pub line_spacing: f32,
    /// Pixels before the paragraph.
    pub space_before: f32,
    /// Pixels after the paragraph.
    pub space_after: f32,
    /// Declared gap to the next paragraph as a fraction of the default line
    /// height; `None` uses the 35% fallback.
    pub gap_ratio: Option<f32>,
    pub default_style: RunStyle,
}

impl Paragraph {
    /// Fallback gap between paragraphs, as a fraction of line height.
    pub const DEFAULT_GAP_RATIO: f32 = 0.35;

    /// Line height of the largest run, or of the default style when empty.
    pub fn default_line_height(&self) -> f32 {
        let size = self
            .runs
            .iter()
            .map(|r| r.style.font_size)
            .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))))
            .unwrap_or(self.default_style.font_size);
        size * LINE_HEIGHT_FACTOR
    }

    /// Gap inserted after this paragraph when another one follows.
    pub fn gap(&self) -> f32 {
        self.gap_ratio.unwrap_or(Self::DEFAULT_GAP_RATIO) * self.default_line_height()
    }
}

/// A span of text sharing one formatting set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

/// Underline variant of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnderlineKind {
    #[default]
    None,
    Single,
    Double,
    SingleWords,
    DoubleWords,
}

impl UnderlineKind {
    /// Map a `u` attribute value. Returns `None` for values we do not draw.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "sng" => Some(Self::Single),
            "dbl" => Some(Self::Double),
            "sngWrd" => Some(Self::SingleWords),
            "dblWrd" => Some(Self::DoubleWords),
            _ => None,
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Self::Double | Self::DoubleWords)
    }

    /// Word-only variants skip whitespace.
    pub fn words_only(&self) -> bool {
        matches!(self, Self::SingleWords | Self::DoubleWords)
    }
}

/// Text outline stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextOutline {
    pub color: Rgb,
    /// Width in scaled pixels, at least 1.
    pub width: f32,
}

/// Fully resolved run formatting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    /// Font size in scaled pixels.
    pub font_size: f32,
    pub color: Rgb,
    pub underline: UnderlineKind,
    pub underline_color: Rgb,
    pub strike: bool,
    pub strike_color: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub outline: Option<TextOutline>,
}

impl RunStyle {
    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR
    }
}
