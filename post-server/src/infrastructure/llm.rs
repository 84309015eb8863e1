//! HTTP clients for the text- and image-generation services.
//!
//! Both services are opaque request/response endpoints; the generation
//! pipeline only sees the [`TextGenerator`] and [`ImageGenerator`] traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::ai_config::AiConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const IMAGE_SIZE: &str = "1024x1024";
const IMAGE_QUALITY: &str = "standard";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0} API key is not configured")]
    MissingCredential(&'static str),
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("download failed: HTTP {status}")]
    Download { status: u16 },
    #[error("service returned an empty response")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model(&self) -> &str;
    async fn complete(&self, prompt: &Prompt) -> Result<String, AiError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns the URL of the generated image.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
    async fn download(&self, url: &str) -> Result<Vec<u8>, AiError>;
}

pub fn http_client(config: &AiConfig) -> Result<Client, AiError> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
        .build()
        .map_err(AiError::from)
}

/// Picks the provider from the model name prefix.
pub fn text_generator(
    config: &AiConfig,
    client: Client,
) -> Result<Arc<dyn TextGenerator>, AiError> {
    let model = config.default_model.as_str();

    if model.starts_with("gpt-") {
        if !config.has_openai_key() {
            return Err(AiError::MissingCredential("OpenAI"));
        }
        Ok(Arc::new(OpenAiChat {
            client,
            base_url: trim_base(&config.openai_base_url),
            api_key: config.openai_api_key.clone(),
            model: model.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }))
    } else if model.starts_with("claude-") {
        if !config.has_anthropic_key() {
            return Err(AiError::MissingCredential("Anthropic"));
        }
        Ok(Arc::new(AnthropicChat {
            client,
            base_url: trim_base(&config.anthropic_base_url),
            api_key: config.anthropic_api_key.clone(),
            model: model.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }))
    } else {
        Err(AiError::UnsupportedModel(model.to_string()))
    }
}

/// `None` when no OpenAI key is configured.
pub fn image_generator(config: &AiConfig, client: Client) -> Option<Arc<dyn ImageGenerator>> {
    if !config.has_openai_key() {
        return None;
    }
    Some(Arc::new(OpenAiImages {
        client,
        base_url: trim_base(&config.openai_base_url),
        api_key: config.openai_api_key.clone(),
        model: config.image_model.clone(),
    }))
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AiError::Status {
        status: status.as_u16(),
        body,
    })
}

pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiChat {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, AiError> {
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": prompt.system },
                    { "role": "user", "content": prompt.user },
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            }))
            .send()
            .await?;

        let completion: ChatCompletion = ensure_success(resp).await?.json().await?;
        debug!(model = %self.model, "chat completion received");

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

pub struct AnthropicChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicMessage {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl TextGenerator for AnthropicChat {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, AiError> {
        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.model,
                "system": prompt.system,
                "messages": [{ "role": "user", "content": prompt.user }],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            }))
            .send()
            .await?;

        let message: AnthropicMessage = ensure_success(resp).await?.json().await?;
        debug!(model = %self.model, "message received");

        let text: String = message
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            Err(AiError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

pub struct OpenAiImages {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

#[async_trait]
impl ImageGenerator for OpenAiImages {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let resp = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "size": IMAGE_SIZE,
                "quality": IMAGE_QUALITY,
                "n": 1,
            }))
            .send()
            .await?;

        let images: ImagesResponse = ensure_success(resp).await?.json().await?;
        images
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| AiError::Malformed("image response carried no url".into()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AiError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Download {
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
