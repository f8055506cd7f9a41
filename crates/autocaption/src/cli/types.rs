//! CLI enum types shared by commands.

use clap::ValueEnum;

/// Supported caption providers.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Provider {
    /// Hugging Face Inference API or a compatible self-hosted endpoint
    Huggingface,
    /// Local Ollama instance
    Ollama,
    /// OpenAI API
    Openai,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Huggingface => write!(f, "huggingface"),
            Provider::Ollama => write!(f, "ollama"),
            Provider::Openai => write!(f, "openai"),
        }
    }
}

/// Output formats for the `caption` command.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Caption and hashtags as plain text
    #[default]
    Text,
    /// One JSON object per line
    Jsonl,
}
