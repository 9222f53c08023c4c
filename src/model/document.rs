//! Document-level types.

use super::{PageProfile, PageRecord};
use serde::{Deserialize, Serialize};

/// Composition of a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Every page has a text layer
    Pure,
    /// No page has a text layer
    Scanned,
    /// Some pages have a text layer, some don't
    Combined,
}

impl DocumentKind {
    /// Aggregate page profiles.
    ///
    /// An empty profile list counts as `Scanned` (no page has text).
    pub fn from_profiles(profiles: &[PageProfile]) -> Self {
        let with_text = profiles.iter().filter(|p| p.has_text).count();
        if with_text == 0 {
            DocumentKind::Scanned
        } else if with_text == profiles.len() {
            DocumentKind::Pure
        } else {
            DocumentKind::Combined
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pure => write!(f, "pure"),
            DocumentKind::Scanned => write!(f, "scanned"),
            DocumentKind::Combined => write!(f, "combined"),
        }
    }
}

/// Classification of a document and each of its pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentClassification {
    /// Aggregate kind
    pub kind: DocumentKind,

    /// Per-page profiles, in page order
    pub pages: Vec<PageProfile>,
}

impl DocumentClassification {
    /// Build from page profiles.
    pub fn from_profiles(pages: Vec<PageProfile>) -> Self {
        Self {
            kind: DocumentKind::from_profiles(&pages),
            pages,
        }
    }

    /// Number of pages that will go through the vision model as a whole.
    pub fn scanned_pages(&self) -> usize {
        self.pages.iter().filter(|p| !p.has_text).count()
    }

    /// Total number of embedded images on text pages.
    pub fn embedded_images(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.has_text)
            .map(|p| p.image_count)
            .sum()
    }
}

/// Extracted content of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Source document label
    pub source: String,

    /// Aggregate kind
    pub kind: DocumentKind,

    /// One record per processed page, in page order
    pub pages: Vec<PageRecord>,
}

impl ExtractionResult {
    /// Get the record for a page number (1-indexed).
    pub fn get_page(&self, page: u32) -> Option<&PageRecord> {
        self.pages.iter().find(|r| r.page == page)
    }

    /// Number of records.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Check if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Concatenated content of all pages.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Take the page records.
    pub fn into_records(self) -> Vec<PageRecord> {
        self.pages
    }
}
