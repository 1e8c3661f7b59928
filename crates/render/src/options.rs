//! Conversion settings.

use crate::font::{FixedAdvance, FontBook, Fonts};
use deck_core::{Result, Rgb};
use std::path::PathBuf;

/// Default supersampling factor over 96 DPI.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Settings for one conversion.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Supersampling factor; slide pixels are 96 DPI times this.
    pub scale: f32,
    /// Font file to use instead of discovery.
    pub font_path: Option<PathBuf>,
    /// In-memory font to use instead of discovery. Wins over `font_path`.
    pub font_data: Option<Vec<u8>>,
    /// Extra directories searched before the platform font directories.
    pub font_dirs: Vec<PathBuf>,
    /// Color painted before any shape.
    pub background: Rgb,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            font_path: None,
            font_data: None,
            font_dirs: Vec::new(),
            background: Rgb::WHITE,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn with_font_data(mut self, data: Vec<u8>) -> Self {
        self.font_data = Some(data);
        self
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    pub fn with_background(mut self, color: Rgb) -> Self {
        self.background = color;
        self
    }

    /// Load the configured font, or discover one.
    ///
    /// An explicit font that cannot be loaded is an error. When discovery
    /// finds nothing, text falls back to fixed advances and is not painted.
    pub fn resolve_fonts(&self) -> Result<Fonts> {
        if let Some(data) = &self.font_data {
            return Ok(Fonts::Outlines(FontBook::from_bytes(data.clone())?));
        }
        if let Some(path) = &self.font_path {
            return Ok(Fonts::Outlines(FontBook::load(path)?));
        }
        match FontBook::discover(&self.font_dirs) {
            Some(book) => Ok(Fonts::Outlines(book)),
            None => {
                log::warn!("No usable system font found; text will be laid out but not drawn");
                Ok(Fonts::Metrics(FixedAdvance::default()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::Error;

    #[test]
    fn test_builder() {
        let options = RenderOptions::new()
            .with_scale(1.5)
            .with_font_dir("/opt/fonts")
            .with_background(Rgb::BLACK);
        assert_eq!(options.scale, 1.5);
        assert_eq!(options.font_dirs, vec![PathBuf::from("/opt/fonts")]);
        assert_eq!(options.background, Rgb::BLACK);
        assert_eq!(RenderOptions::default().scale, DEFAULT_SCALE);
    }

    #[test]
    fn test_explicit_bad_font_fails() {
        let options = RenderOptions::new().with_font_data(b"nope".to_vec());
        assert!(matches!(
            options.resolve_fonts(),
            Err(Error::UnsupportedEnvironment(_))
        ));
    }
}
