//! Core slide model, unit conversions, progress events and errors
//! for PPTX to PDF rendering.

pub mod error;
pub mod progress;
pub mod types;
pub mod units;

pub use error::{Error, Result};
pub use progress::{Phase, ProgressEvent};
pub use types::{
    Alignment, Anchor, DashStyle, FlowDirection, Geometry, LineJoin, Paragraph, PxRect, Rgb, Run,
    RunStyle, Shape, ShapeKind, SlideSize, Stroke, TextBody, TextOutline, Transform,
    UnderlineKind,
};
