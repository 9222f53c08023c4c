//! Page extraction.
//!
//! One routine handles every document kind. Each page is routed by its
//! [`PageKind`]:
//!
//! - `Text`: the text layer followed by a newline.
//! - `TextWithImages`: the text layer and a newline, then one line per
//!   embedded image the vision model found something in.
//! - `Scanned`: the whole page is rendered and the model's answer, verbatim,
//!   is the page content.
//!
//! An embedded image whose answer is the configured no-data marker adds
//! nothing to its page.

use std::path::Path;

use crate::classify::{scan_pages, PageScan};
use crate::config::Config;
use crate::error::Result;
use crate::model::{DocumentKind, ExtractionResult, PageKind, PageRecord};
use crate::parser::{ExtractOptions, LopdfBackend, PdfBackend};
use crate::raster::RenderSettings;
use crate::vision::{is_no_data, OpenAiVision, VisionModel};

/// Extracts per-page text from PDF documents.
pub struct Extractor {
    vision: Box<dyn VisionModel>,
    no_data_marker: String,
    render: RenderSettings,
    options: ExtractOptions,
}

impl Extractor {
    /// Create an extractor around an existing vision model.
    pub fn new(config: &Config, vision: Box<dyn VisionModel>) -> Self {
        Self {
            vision,
            no_data_marker: config.no_data_marker.clone(),
            render: config.render_settings(),
            options: ExtractOptions::default(),
        }
    }

    /// Create an extractor talking to the configured OpenAI-compatible endpoint.
    ///
    /// The API key is read from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let vision = OpenAiVision::from_env(config)?;
        Ok(Self::new(config, Box::new(vision)))
    }

    /// Set extraction options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Current extraction options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract a PDF file. The record source is the file path.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<ExtractionResult> {
        let path = path.as_ref();
        let backend = LopdfBackend::open_with_settings(path, &self.render)?;
        self.extract_backend(&backend, &path.display().to_string())
    }

    /// Extract a PDF file, logging any failure and returning no records.
    pub fn extract_or_empty<P: AsRef<Path>>(&self, path: P) -> Vec<PageRecord> {
        let path = path.as_ref();
        match self.extract(path) {
            Ok(result) => result.into_records(),
            Err(e) if e.is_not_found() => {
                log::error!("{} does not exist", path.display());
                Vec::new()
            }
            Err(e) => {
                log::error!("Failed to extract {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Extract through an already opened backend.
    pub fn extract_backend<B: PdfBackend + ?Sized>(
        &self,
        backend: &B,
        source: &str,
    ) -> Result<ExtractionResult> {
        let scans = scan_pages(backend, &self.options)?;
        let profiles: Vec<_> = scans.iter().map(|s| s.profile.clone()).collect();
        let kind = DocumentKind::from_profiles(&profiles);

        log::info!("{}: {} document, {} page(s)", source, kind, scans.len());

        let mut pages = Vec::with_capacity(scans.len());
        for scan in scans {
            let page_kind = scan.profile.kind();
            log::info!("Page {}: {}", scan.profile.page, page_kind);

            let page = scan.profile.page;
            let content = self.extract_page(backend, page_kind, scan)?;
            pages.push(PageRecord::new(page, content, source, page_kind));
        }

        Ok(ExtractionResult {
            source: source.to_string(),
            kind,
            pages,
        })
    }

    fn extract_page<B: PdfBackend + ?Sized>(
        &self,
        backend: &B,
        kind: PageKind,
        scan: PageScan,
    ) -> Result<String> {
        let page = scan.profile.page;

        match kind {
            PageKind::Scanned => {
                let image = backend.render_page(page)?;
                self.vision.describe(&image)
            }
            PageKind::Text => Ok(scan.text + "\n"),
            PageKind::TextWithImages => {
                let mut content = scan.text + "\n";
                if !self.options.describe_images {
                    log::debug!(
                        "Page {}: skipping {} image(s)",
                        page,
                        scan.profile.image_count
                    );
                    return Ok(content);
                }

                let images = self.options.error_mode.recover(
                    backend.page_images(page),
                    format_args!("Page {}: images unreadable", page),
                )?;
                for (i, image) in images.iter().enumerate() {
                    let answer = self.vision.describe(image)?;
                    if is_no_data(&answer, &self.no_data_marker) {
                        log::debug!("Page {} image {}: no data", page, i + 1);
                        continue;
                    }
                    content.push_str(&answer);
                    content.push('\n');
                }
                Ok(content)
            }
        }
    }
}
