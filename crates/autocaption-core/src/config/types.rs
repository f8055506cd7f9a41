//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory uploaded images are written to (supports `~`)
    pub upload_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upload_dir: "uploads".to_string(),
        }
    }
}

/// Limits applied to uploads before they reach a caption provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_upload_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Format probe timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Image formats accepted for captioning
    pub supported_formats: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 16,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            supported_formats: vec![
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
            ],
        }
    }
}

/// Caption generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Provider name: "huggingface", "ollama" or "openai"
    pub provider: String,

    /// Token budget used when the form omits `length`
    pub default_length: u32,

    /// Smallest accepted token budget
    pub min_length: u32,

    /// Largest accepted token budget
    pub max_length: u32,

    /// Maximum concurrent inference calls
    pub workers: usize,

    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,

    /// Max retry attempts for transient failures
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            default_length: 80,
            min_length: 10,
            max_length: 200,
            workers: 2,
            timeout_ms: 60_000,
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// Hashtag extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashtagConfig {
    /// Maximum hashtags derived from one caption
    pub max_tags: usize,
}

impl Default for HashtagConfig {
    fn default() -> Self {
        Self { max_tags: 6 }
    }
}

/// Post scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Delay between upload and the simulated post, in seconds
    pub delay_secs: u64,

    /// Capacity of the submission channel feeding the scheduler task
    pub queue_capacity: usize,

    /// Maximum posts waiting to fire at once
    pub max_pending: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            delay_secs: 60,
            queue_capacity: 256,
            max_pending: 1024,
        }
    }
}

/// Caption job registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Job records kept for status queries
    pub max_records: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { max_records: 1000 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Inference backend configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Hugging Face image-to-text endpoint
    pub huggingface: Option<HuggingFaceConfig>,

    /// Ollama (local) configuration
    pub ollama: Option<OllamaConfig>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,
}

/// Hugging Face image-to-text configuration.
///
/// `endpoint` may point at the hosted inference API or at a self-hosted
/// endpoint serving the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// Inference endpoint base URL
    pub endpoint: String,

    /// API token (supports ${ENV_VAR} syntax, may be empty for self-hosted)
    pub api_key: String,

    /// Model id
    pub model: String,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            api_key: "${HF_API_TOKEN}".to_string(),
            model: "Salesforce/blip-image-captioning-base".to_string(),
        }
    }
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2-vision".to_string(),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}
