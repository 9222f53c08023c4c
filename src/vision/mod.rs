//! Vision model access.
//!
//! The extractor only sees the [`VisionModel`] trait. [`OpenAiVision`] talks to
//! an OpenAI-compatible chat completion endpoint; tests and offline callers
//! plug in their own implementation.

mod openai;

pub use openai::OpenAiVision;

use crate::error::Result;
use crate::model::EncodedImage;

/// Turns an image into text.
pub trait VisionModel {
    /// Describe one image. Errors are returned to the caller unhandled.
    fn describe(&self, image: &EncodedImage) -> Result<String>;
}

impl<V: VisionModel + ?Sized> VisionModel for Box<V> {
    fn describe(&self, image: &EncodedImage) -> Result<String> {
        (**self).describe(image)
    }
}

impl<V: VisionModel + ?Sized> VisionModel for &V {
    fn describe(&self, image: &EncodedImage) -> Result<String> {
        (**self).describe(image)
    }
}

/// Whether a model answer is the "nothing here" marker.
///
/// Surrounding whitespace and a single pair of quotes are ignored.
pub fn is_no_data(answer: &str, marker: &str) -> bool {
    let answer = answer.trim();
    let answer = answer
        .strip_prefix('"')
        .and_then(|a| a.strip_suffix('"'))
        .unwrap_or(answer);
    answer == marker
}
