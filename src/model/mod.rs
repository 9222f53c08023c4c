//! Data model shared by classification, extraction, and output.

mod document;
mod image;
mod page;

pub use document::{DocumentClassification, DocumentKind, ExtractionResult};
pub use image::{detect_mime_type, EncodedImage};
pub use page::{PageKind, PageProfile, PageRecord};
