//! Caption provider trait and request/response types.
//!
//! Defines the interface every inference backend implements, plus the
//! factory that builds the configured backend.

use crate::config::LlmConfig;
use crate::error::{CaptionError, ConfigError};
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;

/// Base64-encoded image ready to send to an inference API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and their MIME type.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A request to caption one image.
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    /// The image to caption
    pub image: ImageInput,
    /// Instruction for chat-style vision models; plain captioners ignore it
    pub prompt: String,
    /// Maximum new tokens to generate
    pub max_tokens: u32,
}

impl CaptionRequest {
    /// Build a caption request with the default social-post prompt.
    pub fn new(image: ImageInput, max_tokens: u32) -> Self {
        Self {
            image,
            prompt: "Write a one-sentence caption describing this photo for a social media post. \
                     Reply with the caption only."
                .to_string(),
            max_tokens,
        }
    }
}

/// The response from a caption call.
#[derive(Debug, Clone)]
pub struct CaptionResponse {
    /// Generated caption text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all caption backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the service holds an `Arc<dyn CaptionProvider>`).
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Provider name for logging (e.g., "huggingface", "ollama").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Check whether the provider is configured and reachable.
    async fn is_available(&self) -> bool;

    /// Generate a caption for the given request.
    async fn caption(&self, request: &CaptionRequest) -> Result<CaptionResponse, CaptionError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Turn a non-success HTTP response into an inference error carrying the status.
pub(crate) async fn http_error(provider: &str, resp: reqwest::Response) -> CaptionError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    CaptionError::Inference {
        message: format!("{provider} HTTP {status}: {text}"),
        status_code: Some(status.as_u16()),
    }
}

/// Factory that creates the configured provider.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a caption provider by name.
    ///
    /// # Arguments
    /// * `provider` - Provider identifier ("huggingface", "ollama", "openai")
    /// * `config` - The inference backend config section
    /// * `model_override` - Optional model name that overrides the config default
    pub fn create(
        provider: &str,
        config: &LlmConfig,
        model_override: Option<&str>,
    ) -> Result<Arc<dyn CaptionProvider>, ConfigError> {
        match provider {
            "huggingface" | "hf" => {
                let cfg = config.huggingface.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key);
                if api_key.is_none() {
                    tracing::warn!(
                        "No Hugging Face token configured; requests will be anonymous. \
                         Set HF_API_TOKEN for the hosted API."
                    );
                }
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Arc::new(super::huggingface::HuggingFaceProvider::new(
                    &cfg.endpoint,
                    api_key.as_deref(),
                    &model,
                )))
            }
            "ollama" => {
                let cfg = config.ollama.clone().unwrap_or_default();
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Arc::new(super::ollama::OllamaProvider::new(
                    &cfg.endpoint,
                    &model,
                )))
            }
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    ConfigError::ValidationError(
                        "OpenAI API key not set. Set OPENAI_API_KEY env var.".to_string(),
                    )
                })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Arc::new(super::openai::OpenAiProvider::new(&api_key, &model)))
            }
            other => Err(ConfigError::ValidationError(format!(
                "Unknown caption provider: {other}"
            ))),
        }
    }
}
