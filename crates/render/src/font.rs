//! Font metrics and glyph outlines.
//!
//! Text is drawn with one sans-serif family found on the system (or given
//! explicitly). Missing bold and italic faces are synthesized from the
//! regular face. Without any usable font, a fixed-advance fallback keeps
//! layout working and glyphs are simply not painted.

use deck_core::{Error, Result, RunStyle};
use std::path::{Path, PathBuf};
use tiny_skia::PathBuilder;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

/// Environment variable holding extra font directories.
pub const FONT_DIR_ENV: &str = "DECK_FONT_DIR";

/// Horizontal skew applied for synthetic italics.
const SYNTHETIC_ITALIC_SKEW: f32 = 0.2;

/// Extra stroke width for synthetic bold, as a fraction of font size.
const SYNTHETIC_BOLD_WEIGHT: f32 = 0.04;

/// How deep to walk font directories.
const MAX_FONT_DIR_DEPTH: usize = 4;

/// Candidate files per family: regular, bold, italic, bold italic.
const FAMILY_CANDIDATES: &[[&str; 4]] = &[
    ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"],
    ["Arial.ttf", "Arial Bold.ttf", "Arial Italic.ttf", "Arial Bold Italic.ttf"],
    [
        "LiberationSans-Regular.ttf",
        "LiberationSans-Bold.ttf",
        "LiberationSans-Italic.ttf",
        "LiberationSans-BoldItalic.ttf",
    ],
    [
        "DejaVuSans.ttf",
        "DejaVuSans-Bold.ttf",
        "DejaVuSans-Oblique.ttf",
        "DejaVuSans-BoldOblique.ttf",
    ],
    [
        "NotoSans-Regular.ttf",
        "NotoSans-Bold.ttf",
        "NotoSans-Italic.ttf",
        "NotoSans-BoldItalic.ttf",
    ],
    ["Helvetica.ttc", "", "", ""],
];

/// Font selection for one token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontRequest {
    /// Size in pixels.
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl From<&RunStyle> for FontRequest {
    fn from(style: &RunStyle) -> Self {
        Self {
            size: style.font_size,
            bold: style.bold,
            italic: style.italic,
        }
    }
}

/// Measures the advance width of text.
pub trait TextMeasure {
    fn measure(&self, text: &str, font: FontRequest) -> f32;
}

/// Glyph outlines positioned on the surface.
pub struct OutlinedText {
    pub path: tiny_skia::Path,
    /// Extra stroke width to paint in the fill color, for synthetic bold.
    pub embolden: f32,
}

/// Metrics plus glyph outlines.
pub trait FontSource: TextMeasure {
    /// Outline `text` with its pen starting at `(x, baseline)`. `None` when
    /// nothing would be painted.
    fn outline(&self, text: &str, font: FontRequest, x: f32, baseline: f32) -> Option<OutlinedText>;
}

/// Every character advances by a fixed fraction of the font size.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub em_ratio: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { em_ratio: 0.5 }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str, font: FontRequest) -> f32 {
        text.chars().count() as f32 * font.size * self.em_ratio
    }
}

impl FontSource for FixedAdvance {
    fn outline(&self, _: &str, _: FontRequest, _: f32, _: f32) -> Option<OutlinedText> {
        None
    }
}

/// Loaded font faces of one family.
#[derive(Debug, Clone)]
pub struct FontBook {
    regular: Vec<u8>,
    bold: Option<Vec<u8>>,
    italic: Option<Vec<u8>>,
    bold_italic: Option<Vec<u8>>,
}

impl FontBook {
    /// Use a single face for every style.
    pub fn from_bytes(regular: Vec<u8>) -> Result<Self> {
        if let Err(e) = Face::parse(&regular, 0) {
            return Err(Error::UnsupportedEnvironment(format!(
                "Font data is not a usable face: {}",
                e
            )));
        }
        Ok(Self {
            regular,
            bold: None,
            italic: None,
            bold_italic: None,
        })
    }

    /// Load a font file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            Error::UnsupportedEnvironment(format!("Cannot read font {}: {}", path.display(), e))
        })?;
        Self::from_bytes(data)
    }

    /// Find a sans-serif family in `extra_dirs`, the `DECK_FONT_DIR`
    /// directories and the platform font directories.
    pub fn discover(extra_dirs: &[PathBuf]) -> Option<Self> {
        let mut dirs = extra_dirs.to_vec();
        dirs.extend(system_font_dirs());

        let mut files = Vec::new();
        for dir in &dirs {
            collect_font_files(dir, MAX_FONT_DIR_DEPTH, &mut files);
        }

        let find = |name: &str| -> Option<Vec<u8>> {
            if name.is_empty() {
                return None;
            }
            files
                .iter()
                .filter(|path| path.file_name().is_some_and(|f| f == name))
                .find_map(|path| {
                    let data = std::fs::read(path).ok()?;
                    let usable = Face::parse(&data, 0).is_ok();
                    usable.then_some(data)
                })
        };

        for [regular, bold, italic, bold_italic] in FAMILY_CANDIDATES {
            if let Some(data) = find(*regular) {
                log::debug!("Using font family starting with {}", regular);
                return Some(Self {
                    regular: data,
                    bold: find(*bold),
                    italic: find(*italic),
                    bold_italic: find(*bold_italic),
                });
            }
        }
        None
    }

    /// Parse every face once. The result borrows the font data and serves
    /// all measuring and outlining for a conversion.
    pub fn faces(&self) -> Result<FaceSet<'_>> {
        let regular = Face::parse(&self.regular, 0).map_err(|e| {
            Error::UnsupportedEnvironment(format!("Font data is not a usable face: {}", e))
        })?;
        Ok(FaceSet {
            regular,
            bold: parse_optional(&self.bold),
            italic: parse_optional(&self.italic),
            bold_italic: parse_optional(&self.bold_italic),
        })
    }
}

/// Parsed faces of one family.
pub struct FaceSet<'a> {
    regular: Face<'a>,
    bold: Option<Face<'a>>,
    italic: Option<Face<'a>>,
    bold_italic: Option<Face<'a>>,
}

impl<'a> FaceSet<'a> {
    /// Face for a style, and which styles must be synthesized.
    fn face_for(&self, bold: bool, italic: bool) -> (&Face<'a>, bool, bool) {
        let exact = match (bold, italic) {
            (true, true) => self.bold_italic.as_ref(),
            (true, false) => self.bold.as_ref(),
            (false, true) => self.italic.as_ref(),
            (false, false) => Some(&self.regular),
        };
        if let Some(face) = exact {
            return (face, false, false);
        }
        if bold && italic {
            if let Some(face) = self.bold.as_ref() {
                return (face, false, true);
            }
            if let Some(face) = self.italic.as_ref() {
                return (face, true, false);
            }
        }
        (&self.regular, bold, italic)
    }
}

impl TextMeasure for FaceSet<'_> {
    fn measure(&self, text: &str, font: FontRequest) -> f32 {
        let (face, _, _) = self.face_for(font.bold, font.italic);
        let scale = font.size / face.units_per_em() as f32;
        text.chars().map(|c| advance(face, c) as f32 * scale).sum()
    }
}

impl FontSource for FaceSet<'_> {
    fn outline(&self, text: &str, font: FontRequest, x: f32, baseline: f32) -> Option<OutlinedText> {
        let (face, synthetic_bold, synthetic_italic) = self.face_for(font.bold, font.italic);
        let scale = font.size / face.units_per_em() as f32;
        let skew = if synthetic_italic {
            SYNTHETIC_ITALIC_SKEW
        } else {
            0.0
        };

        let mut builder = GlyphPathBuilder::new(x, baseline, scale, skew);
        for c in text.chars() {
            let glyph = face.glyph_index(c).unwrap_or(GlyphId(0));
            face.outline_glyph(glyph, &mut builder);
            builder.origin_x += advance(face, c) as f32 * scale;
        }

        Some(OutlinedText {
            path: builder.finish()?,
            embolden: if synthetic_bold {
                font.size * SYNTHETIC_BOLD_WEIGHT
            } else {
                0.0
            },
        })
    }
}

/// Either real outlines or the fixed-advance fallback.
pub enum Fonts {
    Outlines(FontBook),
    Metrics(FixedAdvance),
}

impl Fonts {
    /// Parse the loaded faces for use by one conversion.
    pub fn parse(&self) -> Result<ParsedFonts<'_>> {
        Ok(match self {
            Fonts::Outlines(book) => ParsedFonts::Outlines(book.faces()?),
            Fonts::Metrics(fixed) => ParsedFonts::Metrics(*fixed),
        })
    }
}

/// `Fonts` with faces parsed.
pub enum ParsedFonts<'a> {
    Outlines(FaceSet<'a>),
    Metrics(FixedAdvance),
}

impl ParsedFonts<'_> {
    pub fn as_source(&self) -> &dyn FontSource {
        match self {
            ParsedFonts::Outlines(faces) => faces,
            ParsedFonts::Metrics(fixed) => fixed,
        }
    }
}

fn parse_optional(data: &Option<Vec<u8>>) -> Option<Face<'_>> {
    data.as_deref().and_then(|bytes| Face::parse(bytes, 0).ok())
}

fn advance(face: &Face, c: char) -> u16 {
    let glyph = face.glyph_index(c).unwrap_or(GlyphId(0));
    face.glyph_hor_advance(glyph).unwrap_or(0)
}

/// Turns font-unit outlines into a surface path. Font units point up, the
/// surface points down.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
    skew: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32, skew: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
            skew,
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.origin_x + (x + y * self.skew) * self.scale,
            self.origin_y - y * self.scale,
        )
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (px, py) = self.point(x, y);
        self.builder.move_to(px, py);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (px, py) = self.point(x, y);
        self.builder.line_to(px, py);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (c1x, c1y) = self.point(x1, y1);
        let (px, py) = self.point(x, y);
        self.builder.quad_to(c1x, c1y, px, py);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1x, c1y) = self.point(x1, y1);
        let (c2x, c2y) = self.point(x2, y2);
        let (px, py) = self.point(x, y);
        self.builder.cubic_to(c1x, c1y, c2x, c2y, px, py);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(extra) = std::env::var(FONT_DIR_ENV) {
        for path in std::env::split_paths(&extra) {
            if !path.as_os_str().is_empty() {
                dirs.push(path);
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    dirs
}

fn collect_font_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth > 0 {
                collect_font_files(&path, depth - 1, out);
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
        {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(size: f32) -> FontRequest {
        FontRequest {
            size,
            bold: false,
            italic: false,
        }
    }

    #[test]
    fn test_fixed_advance_counts_characters() {
        let fixed = FixedAdvance::default();
        assert_eq!(fixed.measure("Hello", request(20.0)), 50.0);
        assert_eq!(fixed.measure("", request(20.0)), 0.0);
        assert_eq!(fixed.measure("日本", request(10.0)), 10.0);
    }

    #[test]
    fn test_fixed_advance_paints_nothing() {
        assert!(FixedAdvance::default()
            .outline("abc", request(12.0), 0.0, 0.0)
            .is_none());
    }

    #[test]
    fn test_garbage_font_is_unsupported_environment() {
        let err = FontBook::from_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEnvironment(_)));
    }

    #[test]
    fn test_missing_font_file_is_unsupported_environment() {
        let err = FontBook::load(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEnvironment(_)));
    }

    #[test]
    fn test_glyph_builder_flips_and_skews() {
        let builder = GlyphPathBuilder::new(10.0, 100.0, 0.5, 0.2);
        assert_eq!(builder.point(0.0, 0.0), (10.0, 100.0));
        assert_eq!(builder.point(100.0, 0.0), (60.0, 100.0));
        let (x, y) = builder.point(0.0, 100.0);
        assert!((x - 20.0).abs() < 1e-4);
        assert_eq!(y, 50.0);
    }

    #[test]
    fn test_metrics_fallback_parses_to_fixed_advance() {
        let fonts = Fonts::Metrics(FixedAdvance { em_ratio: 0.25 });
        let parsed = fonts.parse().unwrap();
        assert!(matches!(parsed, ParsedFonts::Metrics(_)));
        assert_eq!(parsed.as_source().measure("abcd", request(10.0)), 10.0);
    }

    #[test]
    fn test_discovered_font_measures_positive_widths() {
        // Only meaningful where a system font exists.
        if let Some(book) = FontBook::discover(&[]) {
            let faces = book.faces().unwrap();
            let narrow = faces.measure("i", request(20.0));
            let wide = faces.measure("iiii", request(20.0));
            assert!(narrow > 0.0);
            assert!((wide - narrow * 4.0).abs() < 1e-3);
            assert!(faces.outline("A", request(20.0), 0.0, 20.0).is_some());

            // Styles without their own face fall back to the regular face.
            let bold = FontRequest { bold: true, ..request(20.0) };
            assert!(faces.measure("i", bold) > 0.0);
            if book.bold.is_none() {
                let (_, synthetic_bold, _) = faces.face_for(true, false);
                assert!(synthetic_bold);
            }
        }
    }
}
