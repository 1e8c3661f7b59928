//! PDF assembly: one full-bleed image page per rendered slide.

use deck_core::{Error, Result, SlideSize};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};
use tiny_skia::Pixmap;

/// Zlib level for page images and content streams.
const COMPRESSION_LEVEL: u8 = 6;

const IMAGE_NAME: &[u8] = b"Im1";

/// Collects rendered slides into a PDF document.
pub struct PageAssembler {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    page_ids: Vec<Ref>,
    width_pt: f32,
    height_pt: f32,
}

impl PageAssembler {
    /// Start a document whose pages all match the slide size.
    pub fn new(size: SlideSize) -> Self {
        let (width_pt, height_pt) = size.to_points();
        let mut assembler = Self {
            pdf: Pdf::new(),
            next_id: 1,
            catalog_id: Ref::new(1),
            pages_id: Ref::new(1),
            page_ids: Vec::new(),
            width_pt,
            height_pt,
        };
        assembler.catalog_id = assembler.alloc();
        assembler.pages_id = assembler.alloc();
        assembler
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn page_size(&self) -> (f32, f32) {
        (self.width_pt, self.height_pt)
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append a page showing `surface` stretched over the whole page.
    pub fn add_page(&mut self, surface: &Pixmap) -> Result<()> {
        let width = i32::try_from(surface.width())
            .map_err(|_| Error::EncodingError("Surface too wide for a PDF image".to_string()))?;
        let height = i32::try_from(surface.height())
            .map_err(|_| Error::EncodingError("Surface too tall for a PDF image".to_string()))?;

        let rgb: Vec<u8> = surface
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue()]
            })
            .collect();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&rgb, COMPRESSION_LEVEL);

        let image_id = self.alloc();
        let content_id = self.alloc();
        let page_id = self.alloc();

        {
            let mut image = self.pdf.image_xobject(image_id, &compressed);
            image.filter(Filter::FlateDecode);
            image.width(width);
            image.height(height);
            image.color_space().device_rgb();
            image.bits_per_component(8);
        }

        let mut content = Content::new();
        content.save_state();
        content.transform([self.width_pt, 0.0, 0.0, self.height_pt, 0.0, 0.0]);
        content.x_object(Name(IMAGE_NAME));
        content.restore_state();
        let raw = content.finish();
        let compressed_content =
            miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), COMPRESSION_LEVEL);
        self.pdf
            .stream(content_id, &compressed_content)
            .filter(Filter::FlateDecode);

        {
            let mut page = self.pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, self.width_pt, self.height_pt))
                .parent(self.pages_id)
                .contents(content_id);
            page.resources().x_objects().pair(Name(IMAGE_NAME), image_id);
        }

        self.page_ids.push(page_id);
        log::debug!(
            "Added page {} ({}x{} px image)",
            self.page_ids.len(),
            width,
            height
        );
        Ok(())
    }

    /// Write the page tree and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            return Err(Error::EncodingError(
                "Cannot serialize a document without pages".to_string(),
            ));
        }
        let count = i32::try_from(self.page_ids.len())
            .map_err(|_| Error::EncodingError("Too many pages".to_string()))?;

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf
            .pages(self.pages_id)
            .kids(self.page_ids.iter().copied())
            .count(count);

        Ok(self.pdf.finish())
    }
}
