//! Ollama provider for local vision model captioning.
//!
//! Talks to a local Ollama instance via its HTTP API.
//! No authentication required, just needs Ollama running locally.

use super::provider::{http_error, CaptionProvider, CaptionRequest, CaptionResponse};
use crate::error::CaptionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Ollama /api/generate request body.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: [&'a str; 1],
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl CaptionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(5)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn caption(&self, request: &CaptionRequest) -> Result<CaptionResponse, CaptionError> {
        let url = format!("{}/api/generate", self.endpoint);
        let start = Instant::now();

        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            images: [&request.image.data],
            stream: false,
            options: GenerateOptions {
                temperature: 0.3,
                num_predict: request.max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptionError::Inference {
                message: format!("Ollama request failed: {e}"),
                status_code: None,
            })?;

        if !resp.status().is_success() {
            return Err(http_error("Ollama", resp).await);
        }

        let generated: GenerateResponse =
            resp.json().await.map_err(|e| CaptionError::Inference {
                message: format!("Failed to parse Ollama response: {e}"),
                status_code: None,
            })?;

        let text = generated.response.trim().to_string();
        if text.is_empty() {
            return Err(CaptionError::Inference {
                message: "Ollama returned empty response".to_string(),
                status_code: None,
            });
        }

        Ok(CaptionResponse {
            text,
            model: self.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;

    #[tokio::test]
    async fn test_caption_sends_image_and_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "llava",
                "images": ["AQID"],
                "stream": false,
                "options": { "num_predict": 25 }
            })))
            .with_status(200)
            .with_body(r#"{"response":"A red bicycle leaning on a wall.\n"}"#)
            .create_async()
            .await;

        let provider = OllamaProvider::new(&format!("{}/", server.url()), "llava");
        let request = CaptionRequest::new(ImageInput::from_bytes(&[1, 2, 3], "image/png"), 25);
        let response = provider.caption(&request).await.unwrap();

        assert_eq!(response.text, "A red bicycle leaning on a wall.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let provider = OllamaProvider::new("http://127.0.0.1:9", "llava");
        assert!(!provider.is_available().await);
    }
}
