//! WASM wrapper for PPTX to PDF conversion.
//!
//! Runs the whole conversion inside a Web Worker; progress is reported to
//! an optional JavaScript callback and the result is the PDF bytes.

use deck_core::ProgressEvent;
use deck_pptx::PptxPackage;
use deck_render::{ConvertedDocument, RenderOptions};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Page geometry of a deck, read without rendering it.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeckSummary {
    /// Number of slides, which is also the page count of the PDF.
    pub slide_count: usize,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
}

/// Convert a PPTX file to PDF.
///
/// # Arguments
/// * `data` - The raw bytes of the PPTX file
/// * `font` - Optional TrueType/OpenType font used for all text
/// * `on_progress` - Optional callback receiving `{ phase, percent }`
///
/// # Returns
/// The PDF bytes, or throws with the error message.
#[wasm_bindgen]
pub fn convert_pptx_to_pdf(
    data: &[u8],
    font: Option<Vec<u8>>,
    on_progress: Option<js_sys::Function>,
) -> Result<Vec<u8>, JsValue> {
    let document = convert_impl(data, font, |event| {
        if let Some(callback) = &on_progress {
            if let Ok(value) = serde_wasm_bindgen::to_value(&event) {
                let _ = callback.call1(&JsValue::NULL, &value);
            }
        }
    })
    .map_err(|e| JsValue::from_str(&e))?;
    Ok(document.pdf)
}

/// Report slide count and page size from the package alone.
#[wasm_bindgen]
pub fn inspect_pptx(data: &[u8]) -> Result<JsValue, JsValue> {
    let summary = inspect_impl(data).map_err(|e| JsValue::from_str(&e))?;
    serde_wasm_bindgen::to_value(&summary)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn inspect_impl(data: &[u8]) -> Result<DeckSummary, String> {
    let package = PptxPackage::from_bytes(data).map_err(|e| e.to_string())?;
    let (page_width_pt, page_height_pt) = package.slide_size().to_points();
    Ok(DeckSummary {
        slide_count: package.slide_paths().len(),
        page_width_pt,
        page_height_pt,
    })
}

fn options_for(font: Option<Vec<u8>>) -> RenderOptions {
    match font {
        Some(data) if !data.is_empty() => RenderOptions::new().with_font_data(data),
        _ => RenderOptions::new(),
    }
}

fn convert_impl(
    data: &[u8],
    font: Option<Vec<u8>>,
    on_progress: impl FnMut(ProgressEvent),
) -> Result<ConvertedDocument, String> {
    deck_render::convert(data, &options_for(font), on_progress).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_font_uses_discovery() {
        assert!(options_for(Some(Vec::new())).font_data.is_none());
        assert!(options_for(Some(vec![1, 2, 3])).font_data.is_some());
        assert!(options_for(None).font_data.is_none());
    }

    #[test]
    fn test_errors_are_messages() {
        let err = convert_impl(b"not a deck", None, |_| {}).unwrap_err();
        assert!(err.starts_with("ZIP error"), "{}", err);
    }

    fn deck(slides: usize) -> Vec<u8> {
        use std::io::Write;
        use zip::write::FileOptions;

        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = FileOptions::default();
            zip.start_file("ppt/presentation.xml", options).unwrap();
            zip.write_all(br#"<p:presentation xmlns:p="p"><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#)
                .unwrap();
            for i in 0..slides {
                zip.start_file(format!("ppt/slides/slide{}.xml", i + 1), options)
                    .unwrap();
                zip.write_all(br#"<p:sld xmlns:p="p"><p:cSld><p:spTree/></p:cSld></p:sld>"#)
                    .unwrap();
            }
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_inspect_reads_package_only() {
        let summary = inspect_impl(&deck(2)).unwrap();
        assert_eq!(summary.slide_count, 2);
        assert_eq!((summary.page_width_pt, summary.page_height_pt), (960.0, 540.0));
    }

    #[test]
    fn test_inspect_without_slides_fails() {
        let err = inspect_impl(&deck(0)).unwrap_err();
        assert_eq!(err, "Malformed package: No slides found in PPTX.");
    }
}
