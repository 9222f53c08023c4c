//! # pagesift
//!
//! Page-level text extraction for PDF documents of any composition.
//!
//! Every page is classified by what it carries. Pages with a text layer are
//! read directly; their embedded images, and whole pages that are only an
//! image, are described by a vision-capable language model. The result is
//! one text record per page, ready for retrieval or indexing pipelines.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagesift::{extract_pdf_data, Config};
//!
//! fn main() -> pagesift::Result<()> {
//!     let config = Config::from_file("config.json")?;
//!
//!     // Reads OPENAI_API_KEY; failures are logged and yield no records
//!     for record in extract_pdf_data("report.pdf", &config) {
//!         println!("page {}: {}", record.page, record.content);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Document kinds
//!
//! - **Pure**: every page has a text layer
//! - **Scanned**: no page has a text layer
//! - **Combined**: some pages do, some don't
//!
//! Classification alone needs neither the vision model nor pdfium:
//!
//! ```no_run
//! let classification = pagesift::classify_file("report.pdf")?;
//! println!("{} ({} pages)", classification.kind, classification.pages.len());
//! # Ok::<(), pagesift::Error>(())
//! ```

pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod parser;
pub mod raster;
pub mod vision;

// Re-export commonly used types
pub use config::Config;
pub use detect::{is_pdf, sniff_bytes, sniff_file, PdfHeader};
pub use error::{Error, Result};
pub use extract::Extractor;
pub use model::{
    DocumentClassification, DocumentKind, EncodedImage, ExtractionResult, PageKind, PageProfile,
    PageRecord,
};
pub use output::JsonFormat;
pub use parser::{ErrorMode, ExtractOptions, LopdfBackend, PageSelection, PdfBackend};
pub use raster::{PageRenderer, PdfiumRenderer, RenderSettings};
pub use vision::{OpenAiVision, VisionModel};

use std::path::Path;

/// Classify a PDF file as pure, scanned, or combined.
///
/// # Example
///
/// ```no_run
/// use pagesift::{classify_file, DocumentKind};
///
/// let classification = classify_file("document.pdf").unwrap();
/// if classification.kind == DocumentKind::Scanned {
///     println!("{} pages need the vision model", classification.scanned_pages());
/// }
/// ```
pub fn classify_file<P: AsRef<Path>>(path: P) -> Result<DocumentClassification> {
    classify::classify_file(path, &ExtractOptions::default())
}

/// Extract one record per page from a PDF file.
///
/// Builds an [`Extractor`] talking to the configured OpenAI-compatible
/// endpoint. Never fails: a missing file, a missing API key, or any error
/// during extraction is logged and yields an empty list.
///
/// # Example
///
/// ```no_run
/// use pagesift::{extract_pdf_data, Config};
///
/// let config = Config::new("gpt-4o", "Transcribe the tables. Answer no_data if there are none.");
/// let records = extract_pdf_data("scan.pdf", &config);
/// ```
pub fn extract_pdf_data<P: AsRef<Path>>(path: P, config: &Config) -> Vec<PageRecord> {
    match Extractor::from_config(config) {
        Ok(extractor) => extractor.extract_or_empty(path),
        Err(e) => {
            log::error!("Cannot set up extraction: {}", e);
            Vec::new()
        }
    }
}

/// Extract a PDF file and serialize the result as JSON.
///
/// # Example
///
/// ```no_run
/// use pagesift::{to_json, Config, Extractor, JsonFormat};
///
/// let extractor = Extractor::from_config(&Config::from_file("config.json")?)?;
/// let json = to_json(&extractor, "document.pdf", JsonFormat::Pretty)?;
/// std::fs::write("output.json", json)?;
/// # Ok::<(), pagesift::Error>(())
/// ```
pub fn to_json<P: AsRef<Path>>(extractor: &Extractor, path: P, format: JsonFormat) -> Result<String> {
    let result = extractor.extract(path)?;
    output::to_json(&result, format)
}
