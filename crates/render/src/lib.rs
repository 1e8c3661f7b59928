//! Renders PPTX decks to PDF.
//!
//! Each slide is parsed into the `deck-core` model, its text is laid out,
//! the slide is rasterized at a supersampling scale and the image becomes
//! one full-bleed PDF page.

pub mod convert;
pub mod font;
pub mod layout;
pub mod options;
pub mod page;
pub mod raster;

pub use convert::{convert, spawn_conversion, ConversionTask, ConvertedDocument};
pub use font::{
    FaceSet, FixedAdvance, FontBook, FontRequest, FontSource, Fonts, ParsedFonts, TextMeasure,
};
pub use layout::{layout_body, BodyLayout, LayoutColumn, LayoutLine, LayoutToken, ParagraphLayout};
pub use options::RenderOptions;
pub use page::PageAssembler;
pub use raster::SlideRasterizer;
