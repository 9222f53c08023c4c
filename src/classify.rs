//! Page and document classification.
//!
//! Every selected page is inspected once: its text layer is read and its
//! drawn images are counted. The resulting [`PageProfile`]s decide both the
//! aggregate [`DocumentKind`](crate::model::DocumentKind) and how each page is routed during extraction.

use std::path::Path;

use crate::error::Result;
use crate::model::{DocumentClassification, PageProfile};
use crate::parser::{ExtractOptions, LopdfBackend, PdfBackend};

/// A page profile together with the text layer it was derived from.
#[derive(Debug, Clone)]
pub struct PageScan {
    /// Observed composition
    pub profile: PageProfile,
    /// Raw text layer (may be empty)
    pub text: String,
}

/// Whether extracted text counts as a text layer.
pub fn has_text_layer(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Inspect every selected page of a document.
pub fn scan_pages<B: PdfBackend + ?Sized>(
    backend: &B,
    options: &ExtractOptions,
) -> Result<Vec<PageScan>> {
    let mode = options.error_mode;
    let mut scans = Vec::new();

    for page in backend
        .page_numbers()
        .into_iter()
        .filter(|p| options.pages.includes(*p))
    {
        let text = mode.recover(
            backend.page_text(page),
            format_args!("Page {}: text layer unreadable", page),
        )?;
        let image_count = mode.recover(
            backend.page_image_count(page),
            format_args!("Page {}: images unreadable", page),
        )?;

        scans.push(PageScan {
            profile: PageProfile::new(page, has_text_layer(&text), image_count),
            text,
        });
    }

    if scans.is_empty() {
        log::warn!("No pages selected for processing");
    }

    Ok(scans)
}

/// Profile every selected page of a document.
pub fn profile_pages<B: PdfBackend + ?Sized>(
    backend: &B,
    options: &ExtractOptions,
) -> Result<Vec<PageProfile>> {
    Ok(scan_pages(backend, options)?
        .into_iter()
        .map(|scan| scan.profile)
        .collect())
}

/// Classify a document through a backend.
pub fn classify<B: PdfBackend + ?Sized>(
    backend: &B,
    options: &ExtractOptions,
) -> Result<DocumentClassification> {
    Ok(DocumentClassification::from_profiles(profile_pages(
        backend, options,
    )?))
}

/// Classify a PDF file. Needs neither the vision model nor pdfium.
pub fn classify_file<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<DocumentClassification> {
    let backend = LopdfBackend::open(path)?;
    classify(&backend, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_text_layer() {
        assert!(has_text_layer("Hello"));
        assert!(has_text_layer("  x\n"));
        assert!(!has_text_layer(""));
        assert!(!has_text_layer(" \n\t\n"));
    }

    #[test]
    fn test_classify_missing_file() {
        let err = classify_file("/no/such/file.pdf", &ExtractOptions::default()).unwrap_err();
        assert!(err.is_not_found());
    }
}
