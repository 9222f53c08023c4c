//! Page rasterization.
//!
//! Scanned pages are sent to the vision model as whole-page images. pdfium is
//! bound at call time, so documents without scanned pages never need the
//! shared library.

use std::path::PathBuf;
use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;

use crate::error::{Error, Result};
use crate::model::EncodedImage;
use crate::parser::encode_png;

/// Renders a whole page (1-indexed) to a transport image.
pub trait PageRenderer {
    /// Rasterize a page.
    fn render(&self, page: u32) -> Result<EncodedImage>;

    /// Text layer as the renderer reads it, for fonts the PDF parser cannot
    /// map to Unicode.
    fn text_layer(&self, page: u32) -> Result<String> {
        Err(Error::TextExtract(format!(
            "page {}: renderer has no text layer",
            page
        )))
    }
}

/// Rasterization settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Scale relative to 72 dpi
    pub scale: f32,

    /// Explicit pdfium library path; falls back to `./lib`, then the system library
    pub library_path: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            library_path: None,
        }
    }
}

/// [`PageRenderer`] backed by pdfium.
pub struct PdfiumRenderer {
    data: Arc<[u8]>,
    settings: RenderSettings,
}

impl PdfiumRenderer {
    /// Create a renderer over the raw bytes of a PDF.
    pub fn new(data: Arc<[u8]>, settings: RenderSettings) -> Self {
        Self { data, settings }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.settings.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./lib"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| Error::Render(format!("cannot load pdfium: {}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PdfiumRenderer {
    fn with_page<T>(&self, page: u32, f: impl FnOnce(&PdfPage<'_>) -> Result<T>) -> Result<T> {
        let index = page
            .checked_sub(1)
            .and_then(|i| i.try_into().ok())
            .ok_or_else(|| Error::Render(format!("invalid page number {}", page)))?;

        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(&self.data, None)
            .map_err(|e| Error::Render(e.to_string()))?;
        let pdf_page = document
            .pages()
            .get(index)
            .map_err(|e| Error::Render(format!("page {}: {}", page, e)))?;

        f(&pdf_page)
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, page: u32) -> Result<EncodedImage> {
        let config = PdfRenderConfig::new().scale_page_by_factor(self.settings.scale);
        let rgba = self.with_page(page, |pdf_page| {
            let bitmap = pdf_page
                .render_with_config(&config)
                .map_err(|e| Error::Render(format!("page {}: {}", page, e)))?;
            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
                .ok_or_else(|| Error::Render(format!("page {}: bitmap size mismatch", page)))
        })?;

        log::debug!("Rendered page {} at {}x{}", page, rgba.width(), rgba.height());
        Ok(EncodedImage::png(&encode_png(&DynamicImage::ImageRgba8(rgba))?))
    }

    fn text_layer(&self, page: u32) -> Result<String> {
        self.with_page(page, |pdf_page| {
            let text = pdf_page
                .text()
                .map_err(|e| Error::TextExtract(format!("page {}: {}", page, e)))?;
            Ok(text.all())
        })
    }
}
