//! Page-level types.

use serde::{Deserialize, Serialize};

/// What a single page carries, decided once per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Text layer, no embedded images
    Text,
    /// Text layer plus embedded images
    TextWithImages,
    /// No text layer; the page itself is an image
    Scanned,
}

impl PageKind {
    /// Classify from the two observable facts about a page.
    pub fn from_parts(has_text: bool, image_count: usize) -> Self {
        match (has_text, image_count) {
            (false, _) => PageKind::Scanned,
            (true, 0) => PageKind::Text,
            (true, _) => PageKind::TextWithImages,
        }
    }

    /// Whether the page has a usable text layer.
    pub fn has_text(&self) -> bool {
        !matches!(self, PageKind::Scanned)
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageKind::Text => write!(f, "text"),
            PageKind::TextWithImages => write!(f, "text+images"),
            PageKind::Scanned => write!(f, "scanned"),
        }
    }
}

/// Observed composition of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProfile {
    /// Page number (1-indexed)
    pub page: u32,

    /// Whether the text layer holds any non-whitespace character
    pub has_text: bool,

    /// Number of distinct embedded raster images drawn on the page
    pub image_count: usize,
}

impl PageProfile {
    /// Create a profile.
    pub fn new(page: u32, has_text: bool, image_count: usize) -> Self {
        Self {
            page,
            has_text,
            image_count,
        }
    }

    /// Routing category for this page.
    pub fn kind(&self) -> PageKind {
        PageKind::from_parts(self.has_text, self.image_count)
    }
}

/// Extracted text for one page; the unit of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page number (1-indexed)
    pub page: u32,

    /// Extracted text
    pub content: String,

    /// Source document (its path, or a caller-supplied label)
    pub source: String,

    /// How the page was routed
    pub kind: PageKind,
}

impl PageRecord {
    /// Create a record.
    pub fn new(page: u32, content: String, source: impl Into<String>, kind: PageKind) -> Self {
        Self {
            page,
            content,
            source: source.into(),
            kind,
        }
    }

    /// Check if the record carries no text.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}
