//! Caption inference backends.
//!
//! Provides a provider abstraction over hosted and self-hosted vision models
//! (Hugging Face Inference, Ollama, OpenAI) plus retry classification for
//! transient failures.

pub(crate) mod huggingface;
pub(crate) mod ollama;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod retry;

pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{CaptionProvider, CaptionRequest, CaptionResponse, ImageInput, ProviderFactory};
