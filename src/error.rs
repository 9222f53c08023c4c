//! Error types for pagesift.

use std::io;
use thiserror::Error;

/// Result type alias for pagesift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while classifying or extracting a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error extracting the text layer of a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error turning an embedded image into a transport image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Error rasterizing a page.
    #[error("Page rendering error: {0}")]
    Render(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The vision model credential is not set.
    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(&'static str),

    /// Transport-level failure talking to the vision model.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vision model answered with an error or an unusable payload.
    #[error("Vision model error: {0}")]
    Vision(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means the input file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
