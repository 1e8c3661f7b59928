//! End-to-end PPTX to PDF conversion.

use crate::options::RenderOptions;
use crate::page::PageAssembler;
use crate::raster::SlideRasterizer;
use deck_core::{Error, ProgressEvent, Result};
use deck_pptx::{PptxPackage, SlideModelBuilder};
use serde::Serialize;
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

/// Wall-clock timer for log lines. `std::time::Instant` panics on
/// wasm32-unknown-unknown, so there every reading is zero.
#[derive(Debug, Clone, Copy)]
struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
}

impl Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    fn start() -> Self {
        Self {
            started: std::time::Instant::now(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn start() -> Self {
        Self {}
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    #[cfg(target_arch = "wasm32")]
    fn elapsed_ms(&self) -> f64 {
        0.0
    }
}

/// A finished PDF.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedDocument {
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub page_count: usize,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
}

/// Convert PPTX bytes to PDF bytes, one page per slide.
///
/// Slides are processed in order. `on_progress` sees a parsing event, one
/// rendering event before each slide and two closing rendering events. No
/// rendering event is emitted when the package fails to open.
pub fn convert(
    data: &[u8],
    options: &RenderOptions,
    mut on_progress: impl FnMut(ProgressEvent),
) -> Result<ConvertedDocument> {
    let started = Stopwatch::start();
    on_progress(ProgressEvent::parsing(10));

    let mut package = PptxPackage::from_bytes(data)?;
    let size = package.slide_size();
    let slide_paths = package.slide_paths().to_vec();
    let theme = package.theme().clone();
    log::info!(
        "Opened package: {} slides, {}x{} EMU, {} theme colors",
        slide_paths.len(),
        size.width_emu,
        size.height_emu,
        theme.len()
    );

    let fonts = options.resolve_fonts()?;
    let faces = fonts.parse()?;
    let rasterizer = SlideRasterizer::new(faces.as_source(), options.scale, options.background);
    // Fail before any slide work when no surface can be allocated.
    rasterizer.surface(size)?;

    let builder = SlideModelBuilder::new(&theme, options.scale);
    let mut assembler = PageAssembler::new(size);
    let total = slide_paths.len();

    for (index, path) in slide_paths.iter().enumerate() {
        on_progress(ProgressEvent::before_slide(index, total));
        let slide_started = Stopwatch::start();

        let xml = package.slide_xml(path)?;
        let relationships = package.slide_relationships(path);
        let shapes = builder.build(&xml, &mut package.images(&relationships))?;
        let surface = rasterizer.render(&shapes, size)?;
        assembler.add_page(&surface)?;

        log::debug!(
            "Rendered {} ({} shapes) in {:.1}ms",
            path,
            shapes.len(),
            slide_started.elapsed_ms()
        );
    }

    on_progress(ProgressEvent::rendering(95));
    let (page_width_pt, page_height_pt) = assembler.page_size();
    let page_count = assembler.page_count();
    let pdf = assembler.finish()?;
    on_progress(ProgressEvent::rendering(100));

    log::info!(
        "Converted {} slides in {:.1}ms ({} bytes)",
        page_count,
        started.elapsed_ms(),
        pdf.len()
    );

    Ok(ConvertedDocument {
        pdf,
        page_count,
        page_width_pt,
        page_height_pt,
    })
}

/// A conversion running on its own thread.
pub struct ConversionTask {
    /// Progress events; closes when the conversion ends.
    pub events: Receiver<ProgressEvent>,
    handle: JoinHandle<Result<ConvertedDocument>>,
}

impl ConversionTask {
    /// Block until the conversion finishes.
    pub fn wait(self) -> Result<ConvertedDocument> {
        self.handle.join().map_err(|_| {
            Error::EncodingError("Conversion thread panicked".to_string())
        })?
    }
}

/// Start a conversion off the calling thread. It cannot be cancelled; drop
/// the task to discard its result.
pub fn spawn_conversion(data: Vec<u8>, options: RenderOptions) -> ConversionTask {
    let (sender, events) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        convert(&data, &options, |event| {
            // The receiver may be gone; the conversion still completes.
            let _ = sender.send(event);
        })
    });
    ConversionTask { events, handle }
}
