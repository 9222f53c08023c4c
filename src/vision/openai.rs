//! OpenAI-compatible chat completion client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::VisionModel;
use crate::config::{load_api_key, Config};
use crate::error::{Error, Result};
use crate::model::EncodedImage;

/// Chat completion request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Chat completion response (only the fields we read).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Vision model reached over an OpenAI-compatible `/chat/completions` API.
pub struct OpenAiVision {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    model: String,
    system_prompt: String,
    instruction: String,
    temperature: f32,
}

impl OpenAiVision {
    /// Build a client from configuration and an explicit API key.
    pub fn new(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let timeout = config.timeout_secs.map(Duration::from_secs);
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.ai_model.clone(),
            system_prompt: config.system_prompt.clone(),
            instruction: config.image_instruction.clone(),
            temperature: config.temperature,
        })
    }

    /// Build a client reading the API key from the environment.
    pub fn from_env(config: &Config) -> Result<Self> {
        Self::new(config, load_api_key()?)
    }

    /// Endpoint URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request<'a>(&'a self, image_url: String) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&self.system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: &self.instruction,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url: image_url },
                        },
                    ]),
                },
            ],
            temperature: self.temperature,
        }
    }
}

impl VisionModel for OpenAiVision {
    fn describe(&self, image: &EncodedImage) -> Result<String> {
        log::debug!(
            "Sending {} image ({} base64 bytes) to {}",
            image.mime_type,
            image.encoded_len(),
            self.model
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(image.data_url()))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Vision(format!("{}: {}", status, body.trim())));
        }

        let parsed: ChatResponse = response.json()?;
        parse_answer(parsed)
    }
}

fn parse_answer(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Vision("response contained no choices".to_string()))
        .map(|choice| choice.message.content.unwrap_or_default())
}
