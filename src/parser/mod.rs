//! PDF access: page text, embedded images, and rendering.

mod backend;
mod content;
mod images;
mod options;
mod text;

pub use backend::{LopdfBackend, PdfBackend};
pub use images::{encode_image_xobject, encode_inline_image, encode_png};
pub use options::{ErrorMode, ExtractOptions, PageSelection};
pub use text::decode_text_simple;
