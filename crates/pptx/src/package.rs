//! Package reader: the zip container, slide listing, theme, slide size and
//! per-slide relationships.

use crate::slide::ImageSource;
use crate::theme::ThemeColors;
use crate::xml::Element;
use deck_core::{Error, Result, SlideSize};
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::sync::LazyLock;
use zip::ZipArchive;

/// Matches slide parts and captures their number.
static SLIDE_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const DEFAULT_THEME_PART: &str = "ppt/theme/theme1.xml";

/// An opened slide deck package.
pub struct PptxPackage<R: Read + Seek> {
    archive: ZipArchive<R>,
    slide_paths: Vec<String>,
    theme: ThemeColors,
    slide_size: SlideSize,
}

impl<'a> PptxPackage<Cursor<&'a [u8]>> {
    /// Open a package held in memory.
    pub fn from_bytes(data: &'a [u8]) -> Result<Self> {
        Self::open(Cursor::new(data))
    }
}

impl<R: Read + Seek> PptxPackage<R> {
    /// Open a package and read its shared parts.
    ///
    /// Fails with `MalformedPackage` when the container has no slide parts.
    pub fn open(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = list_slide_parts(archive.file_names());
        if slide_paths.is_empty() {
            return Err(Error::MalformedPackage("No slides found in PPTX.".to_string()));
        }

        let slide_size = read_slide_size(&mut archive);
        let theme = read_theme(&mut archive);
        log::debug!(
            "Package has {} slides, {} theme colors, slide size {}x{} EMU",
            slide_paths.len(),
            theme.len(),
            slide_size.width_emu,
            slide_size.height_emu
        );

        Ok(Self {
            archive,
            slide_paths,
            theme,
            slide_size,
        })
    }

    /// Slide part names, ordered by slide number.
    pub fn slide_paths(&self) -> &[String] {
        &self.slide_paths
    }

    pub fn theme(&self) -> &ThemeColors {
        &self.theme
    }

    pub fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    /// Read a slide part. A listed slide that cannot be read is fatal.
    pub fn slide_xml(&mut self, slide_path: &str) -> Result<String> {
        read_text(&mut self.archive, slide_path)
            .ok_or_else(|| Error::MalformedPackage(format!("Missing slide XML: {}", slide_path)))
    }

    /// Relationships of a slide part. Missing or unreadable `.rels` parts
    /// give an empty mapping.
    pub fn slide_relationships(&mut self, slide_path: &str) -> Relationships {
        let rels_path = rels_path_for(slide_path);
        let Some(xml) = read_text(&mut self.archive, &rels_path) else {
            log::debug!("No relationships part for {}", slide_path);
            return Relationships::default();
        };
        Relationships::parse(&xml, part_directory(slide_path)).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {}: {}", rels_path, e);
            Relationships::default()
        })
    }

    /// Raw bytes of a part, if present.
    pub fn read_binary(&mut self, path: &str) -> Option<Vec<u8>> {
        let mut file = self.archive.by_name(path).ok()?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data).ok()?;
        Some(data)
    }

    /// Image source for one slide, resolving ids through `relationships`.
    pub fn images<'p>(&'p mut self, relationships: &'p Relationships) -> SlideImages<'p, R> {
        SlideImages {
            package: self,
            relationships,
        }
    }
}

/// Resolves picture relationship ids of one slide against the package.
pub struct SlideImages<'p, R: Read + Seek> {
    package: &'p mut PptxPackage<R>,
    relationships: &'p Relationships,
}

impl<R: Read + Seek> ImageSource for SlideImages<'_, R> {
    fn image_bytes(&mut self, rel_id: &str) -> Option<Vec<u8>> {
        let target = self.relationships.get(rel_id)?;
        let bytes = self.package.read_binary(target);
        if bytes.is_none() {
            log::debug!("Relationship '{}' points at missing part {}", rel_id, target);
        }
        bytes
    }
}

/// Relationship id to package part name for one slide.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    targets: HashMap<String, String>,
}

impl Relationships {
    /// Parse a `.rels` part. Targets are resolved against `base_dir`;
    /// external targets are ignored.
    pub fn parse(xml: &str, base_dir: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        let mut targets = HashMap::new();
        for rel in root.children_named("Relationship") {
            let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) else {
                continue;
            };
            if rel.attr("TargetMode") == Some("External") {
                continue;
            }
            targets.insert(id.to_string(), resolve_target(base_dir, target));
        }
        Ok(Self { targets })
    }

    /// Resolved part name for an id.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.targets.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Slide part names ordered by their numeric suffix.
fn list_slide_parts<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut slides: Vec<(usize, String)> = names
        .filter_map(|name| {
            let number = SLIDE_PART_REGEX
                .captures(name)?
                .get(1)?
                .as_str()
                .parse()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort();
    slides.into_iter().map(|(_, path)| path).collect()
}

fn read_slide_size<R: Read + Seek>(archive: &mut ZipArchive<R>) -> SlideSize {
    let default = SlideSize::default();
    let Some(xml) = read_text(archive, PRESENTATION_PART) else {
        return default;
    };
    match Element::parse(&xml) {
        Ok(root) => {
            let sld_sz = root.child("sldSz");
            SlideSize {
                width_emu: sld_sz
                    .and_then(|s| s.attr_i64("cx"))
                    .unwrap_or(default.width_emu),
                height_emu: sld_sz
                    .and_then(|s| s.attr_i64("cy"))
                    .unwrap_or(default.height_emu),
            }
        }
        Err(e) => {
            log::warn!("Using default slide size, presentation part unreadable: {}", e);
            default
        }
    }
}

fn read_theme<R: Read + Seek>(archive: &mut ZipArchive<R>) -> ThemeColors {
    let theme_path = if archive.by_name(DEFAULT_THEME_PART).is_ok() {
        Some(DEFAULT_THEME_PART.to_string())
    } else {
        let mut themes: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/theme/") && n.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        themes.sort();
        themes.into_iter().next()
    };

    let Some(xml) = theme_path.and_then(|path| read_text(archive, &path)) else {
        log::debug!("No theme part; scheme colors will not resolve");
        return ThemeColors::new();
    };
    ThemeColors::parse(&xml).unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable theme: {}", e);
        ThemeColors::new()
    })
}

/// Read a text part from the archive. `None` when absent or unreadable.
fn read_text<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<String> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    match file.read_to_string(&mut content) {
        Ok(_) => Some(content),
        Err(e) => {
            log::warn!("Failed to read '{}': {}", path, e);
            None
        }
    }
}

/// `ppt/slides/slide3.xml` -> `ppt/slides/_rels/slide3.xml.rels`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn part_directory(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
