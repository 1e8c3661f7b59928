//! PPTX (Office Open XML) package reader and slide model builder.
//!
//! Opens .pptx files (ZIP archives of XML parts), reads the shared theme and
//! slide size, and turns each slide into the typed model of `deck-core`.

pub mod package;
pub mod slide;
pub mod style;
pub mod theme;
pub mod xml;

pub use package::{PptxPackage, Relationships, SlideImages};
pub use slide::{ImageSource, SlideModelBuilder};
pub use theme::ThemeColors;
