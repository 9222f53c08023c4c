//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the per-page facts classification
//! and extraction need, isolating the concrete PDF library (lopdf) and the
//! rasterizer (pdfium) from the routing logic.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use lopdf::content::Operation;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::content::decode_operations;
use super::images::{encode_image_xobject, encode_inline_image, is_image_xobject, resolve_dict};
use super::text::TextCollector;
use crate::classify::has_text_layer;
use crate::detect::{sniff_bytes, sniff_file};
use crate::error::{Error, Result};
use crate::model::EncodedImage;
use crate::raster::{PageRenderer, PdfiumRenderer, RenderSettings};

/// How deep Form XObjects are followed.
const MAX_FORM_DEPTH: u8 = 8;

/// How many `Parent` links are followed when looking for inherited resources.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Abstract interface for PDF page access.
///
/// Page numbers are 1-indexed everywhere.
pub trait PdfBackend {
    /// All page numbers in document order.
    fn page_numbers(&self) -> Vec<u32>;

    /// Text layer of a page (empty when the page has none).
    fn page_text(&self, page: u32) -> Result<String>;

    /// Number of distinct raster images drawn on a page.
    fn page_image_count(&self, page: u32) -> Result<usize>;

    /// Embedded raster images of a page, in draw order.
    fn page_images(&self, page: u32) -> Result<Vec<EncodedImage>>;

    /// Rasterize a whole page.
    fn render_page(&self, page: u32) -> Result<EncodedImage>;
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    renderer: Box<dyn PageRenderer>,
}

impl LopdfBackend {
    /// Open a PDF file with default render settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_settings(path, &RenderSettings::default())
    }

    /// Open a PDF file.
    pub fn open_with_settings<P: AsRef<Path>>(path: P, settings: &RenderSettings) -> Result<Self> {
        let path = path.as_ref();

        // Missing files and non-PDF inputs fail here, before lopdf.
        sniff_file(path)?;

        let data = std::fs::read(path)?;
        Self::from_bytes_with_settings(data, settings)
    }

    /// Load from in-memory bytes with default render settings.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_settings(data, &RenderSettings::default())
    }

    /// Load from in-memory bytes.
    pub fn from_bytes_with_settings(data: Vec<u8>, settings: &RenderSettings) -> Result<Self> {
        sniff_bytes(&data)?;

        let doc = LopdfDocument::load_mem(&data)?;
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; text and images may be unreadable");
        }

        let renderer = PdfiumRenderer::new(Arc::from(data), settings.clone());
        Ok(Self {
            doc,
            renderer: Box::new(renderer),
        })
    }

    /// Replace the page rasterizer.
    pub fn with_renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, pages.len() as u32))
    }

    /// Resources of a page, following `Parent` inheritance.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.doc.get_dictionary(page_id).ok();
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = node?;
            if let Some(resources) = dict
                .get(b"Resources")
                .ok()
                .and_then(|r| resolve_dict(&self.doc, r))
            {
                return Some(resources);
            }
            node = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }
        None
    }

    /// Decompressed content stream of a page. Pages without content yield no bytes.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        let stream_at = |id: ObjectId| match self.doc.get_object(id) {
            Ok(Object::Stream(s)) => Ok(stream_data(s)),
            _ => Err(Error::PdfParse(format!(
                "content stream {} {} R is not a stream",
                id.0, id.1
            ))),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Array(arr)) => concat_streams(arr, stream_at),
                _ => stream_at(*r),
            },
            Object::Array(arr) => concat_streams(arr, stream_at),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    /// Distinct images drawn on a page, in draw order: XObjects (by object id)
    /// and inline images.
    fn drawn_images(&self, page: u32) -> Result<Vec<DrawnImage<'_>>> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        self.visit_page(page, &mut |op, resources| match op.operator.as_str() {
            "Do" => {
                if let Some((id, stream)) = self.xobject(resources, op) {
                    if is_image_xobject(stream) && seen.insert(id) {
                        found.push(DrawnImage::Object(id, stream));
                    }
                }
            }
            "BI" => {
                if let Some(Object::Stream(stream)) = op.operands.first() {
                    found.push(DrawnImage::Inline(stream.clone()));
                }
            }
            _ => {}
        })?;
        Ok(found)
    }

    /// Visit every operation of a page, descending into Form XObjects.
    fn visit_page<'a, F>(&'a self, page: u32, visit: &mut F) -> Result<()>
    where
        F: FnMut(&Operation, Option<&'a Dictionary>),
    {
        let page_id = self.page_id(page)?;
        let content = self.page_content(page_id)?;
        let resources = self.page_resources(page_id);

        let mut visited = HashSet::new();
        self.walk_content(&content, resources, 0, &mut visited, visit)
    }

    fn walk_content<'a, F>(
        &'a self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        depth: u8,
        visited: &mut HashSet<ObjectId>,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&Operation, Option<&'a Dictionary>),
    {
        if content.is_empty() {
            return Ok(());
        }

        for op in decode_operations(content)? {
            visit(&op, resources);

            if op.operator != "Do" {
                continue;
            }
            let Some((id, stream)) = self.xobject(resources, &op) else {
                continue;
            };
            if is_form_xobject(stream) && depth < MAX_FORM_DEPTH && visited.insert(id) {
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(&self.doc, r))
                    .or(resources);
                self.walk_content(
                    &stream_data(stream),
                    form_resources,
                    depth + 1,
                    visited,
                    visit,
                )?;
            }
        }

        Ok(())
    }

    /// The XObject a `Do` operation names.
    fn xobject<'a>(
        &'a self,
        resources: Option<&'a Dictionary>,
        op: &Operation,
    ) -> Option<(ObjectId, &'a Stream)> {
        let name = op.operands.first()?.as_name().ok()?;
        let id = resources?
            .get(b"XObject")
            .ok()
            .and_then(|x| resolve_dict(&self.doc, x))?
            .get(name)
            .and_then(Object::as_reference)
            .ok()?;
        match self.doc.get_object(id) {
            Ok(Object::Stream(stream)) => Some((id, stream)),
            _ => None,
        }
    }

    /// Text gathered operator by operator, including Form XObject content.
    fn collect_text(&self, page: u32) -> Result<(String, bool)> {
        let mut collector = TextCollector::new(&self.doc);
        self.visit_page(page, &mut |op, resources| collector.visit(op, resources))?;
        Ok(collector.finish())
    }
}

/// An image drawn on a page.
enum DrawnImage<'a> {
    Object(ObjectId, &'a Stream),
    Inline(Stream),
}

impl PdfBackend for LopdfBackend {
    fn page_numbers(&self) -> Vec<u32> {
        self.doc.get_pages().keys().copied().collect()
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        let (text, undecoded) = self
            .collect_text(page)
            .map_err(|e| Error::TextExtract(format!("Page {}: {}", page, e)))?;
        if !undecoded {
            return Ok(text);
        }

        // Composite fonts without a Unicode map: pdfium reads those.
        match self.renderer.text_layer(page) {
            Ok(layer) if has_text_layer(&layer) => Ok(layer),
            Ok(_) => Ok(text),
            Err(e) => {
                log::warn!(
                    "Page {}: text in composite fonts could not be decoded: {}",
                    page,
                    e
                );
                Ok(text)
            }
        }
    }

    fn page_image_count(&self, page: u32) -> Result<usize> {
        Ok(self.drawn_images(page)?.len())
    }

    fn page_images(&self, page: u32) -> Result<Vec<EncodedImage>> {
        let mut images = Vec::new();
        for drawn in self.drawn_images(page)? {
            let (encoded, label) = match &drawn {
                DrawnImage::Object(id, stream) => (
                    encode_image_xobject(&self.doc, stream),
                    format!("image {} {} R", id.0, id.1),
                ),
                DrawnImage::Inline(stream) => (
                    encode_inline_image(&self.doc, stream),
                    "inline image".to_string(),
                ),
            };
            match encoded {
                Ok(image) => images.push(image),
                Err(e) => log::warn!("Page {}: skipping {}: {}", page, label, e),
            }
        }
        Ok(images)
    }

    fn render_page(&self, page: u32) -> Result<EncodedImage> {
        self.page_id(page)?;
        self.renderer.render(page)
    }
}

fn is_form_xobject(stream: &Stream) -> bool {
    matches!(
        stream.dict.get(b"Subtype").and_then(|s| s.as_name()),
        Ok(b"Form")
    )
}

/// Stream bytes with filters undone when lopdf knows how.
fn stream_data(stream: &Stream) -> Vec<u8> {
    if stream.dict.get(b"Filter").is_err() {
        return stream.content.clone();
    }
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn concat_streams<F>(refs: &[Object], stream_at: F) -> Result<Vec<u8>>
where
    F: Fn(ObjectId) -> Result<Vec<u8>>,
{
    let mut content = Vec::new();
    for id in refs.iter().filter_map(|o| o.as_reference().ok()) {
        content.extend_from_slice(&stream_at(id)?);
        content.push(b' ');
    }
    Ok(content)
}
