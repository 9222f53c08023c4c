//! Configuration for the vision model and page rendering.
//!
//! Loaded from a JSON file. Only `ai_model` and `image_instruction` are
//! required; everything else has a default:
//!
//! ```json
//! {
//!     "ai_model": "gpt-4o",
//!     "image_instruction": "Describe the tables and formulas in this image. Answer no_data if there are none."
//! }
//! ```
//!
//! The API credential never lives in the file; it is read from
//! [`API_KEY_ENV`] by [`load_api_key`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::RenderSettings;

/// Environment variable holding the vision model API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default system instruction sent with every image.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant which can understand images. \
     Help me analyse data inside tables and math expressions in a given image.";

/// Default base URL of the chat completion API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default answer the model gives for images without useful content.
pub const DEFAULT_NO_DATA_MARKER: &str = "no_data";

/// Extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model identifier (e.g., "gpt-4o")
    pub ai_model: String,

    /// User instruction sent alongside each image
    pub image_instruction: String,

    /// System instruction
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Model answer that marks an image as carrying no data
    #[serde(default = "default_no_data_marker")]
    pub no_data_marker: String,

    /// Request timeout in seconds (no timeout when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Page rasterization scale (1.0 = 72 dpi)
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,

    /// Explicit path to the pdfium shared library
    #[serde(default)]
    pub pdfium_library: Option<PathBuf>,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_no_data_marker() -> String {
    DEFAULT_NO_DATA_MARKER.to_string()
}

fn default_render_scale() -> f32 {
    1.0
}

impl Config {
    /// Create a configuration with defaults for everything but the model and instruction.
    pub fn new(ai_model: impl Into<String>, image_instruction: impl Into<String>) -> Self {
        Self {
            ai_model: ai_model.into(),
            image_instruction: image_instruction.into(),
            system_prompt: default_system_prompt(),
            api_base: default_api_base(),
            temperature: 0.0,
            no_data_marker: default_no_data_marker(),
            timeout_secs: None,
            render_scale: default_render_scale(),
            pdfium_library: None,
        }
    }

    /// Load and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!("config file {} does not exist", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.ai_model.trim().is_empty() {
            return Err(Error::Config("ai_model must not be empty".to_string()));
        }
        if self.image_instruction.trim().is_empty() {
            return Err(Error::Config(
                "image_instruction must not be empty".to_string(),
            ));
        }
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(Error::Config(format!(
                "render_scale must be positive, got {}",
                self.render_scale
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Set the system instruction.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the no-data marker.
    pub fn with_no_data_marker(mut self, marker: impl Into<String>) -> Self {
        self.no_data_marker = marker.into();
        self
    }

    /// Set a request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the rasterization scale.
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    /// Set the pdfium library path.
    pub fn with_pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdfium_library = Some(path.into());
        self
    }

    /// Rendering settings derived from this configuration.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            scale: self.render_scale,
            library_path: self.pdfium_library.clone(),
        }
    }
}

/// Read the API key from [`API_KEY_ENV`].
pub fn load_api_key() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::MissingApiKey(API_KEY_ENV)),
    }
}
