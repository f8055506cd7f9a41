//! Hugging Face image-to-text provider.
//!
//! Talks to the inference API (hosted or self-hosted) for a plain captioning
//! model such as BLIP. The image goes out base64-encoded in `inputs`; the
//! token budget maps to `max_new_tokens`.

use super::provider::{http_error, CaptionProvider, CaptionRequest, CaptionResponse};
use crate::error::CaptionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct HuggingFaceProvider {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl HuggingFaceProvider {
    pub fn new(endpoint: &str, api_key: Option<&str>, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[async_trait]
impl CaptionProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let request = self
            .authorized(self.client.get(self.model_url()))
            .timeout(Duration::from_secs(5));
        match request.send().await {
            // The inference route only accepts POST; any answer means it is reachable.
            Ok(resp) => !resp.status().is_server_error(),
            Err(_) => false,
        }
    }

    async fn caption(&self, request: &CaptionRequest) -> Result<CaptionResponse, CaptionError> {
        let start = Instant::now();

        let body = InferenceRequest {
            inputs: &request.image.data,
            parameters: InferenceParameters {
                max_new_tokens: request.max_tokens,
            },
        };

        let resp = self
            .authorized(self.client.post(self.model_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptionError::Inference {
                message: format!("Hugging Face request failed: {e}"),
                status_code: None,
            })?;

        if !resp.status().is_success() {
            return Err(http_error("Hugging Face", resp).await);
        }

        let generated: Vec<GeneratedText> =
            resp.json().await.map_err(|e| CaptionError::Inference {
                message: format!("Failed to parse Hugging Face response: {e}"),
                status_code: None,
            })?;

        let text = generated
            .into_iter()
            .next()
            .map(|g| g.generated_text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(CaptionError::Inference {
                message: "Hugging Face returned no generated text".to_string(),
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

    fn request() -> CaptionRequest {
        CaptionRequest::new(ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "image/jpeg"), 30)
    }

    #[tokio::test]
    async fn test_caption_parses_generated_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Salesforce/blip-image-captioning-base")
            .match_header("authorization", "Bearer hf_test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "inputs": "/9j/",
                "parameters": { "max_new_tokens": 30 }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"generated_text":" a cat sitting on a windowsill "}]"#)
            .create_async()
            .await;

        let provider = HuggingFaceProvider::new(
            &server.url(),
            Some("hf_test"),
            "Salesforce/blip-image-captioning-base",
        );
        let response = provider.caption(&request()).await.unwrap();

        assert_eq!(response.text, "a cat sitting on a windowsill");
        assert_eq!(response.model, "Salesforce/blip-image-captioning-base");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_caption_reports_status_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/blip")
            .with_status(503)
            .with_body(r#"{"error":"Model is currently loading"}"#)
            .create_async()
            .await;

        let provider = HuggingFaceProvider::new(&server.url(), None, "blip");
        let err = provider.caption(&request()).await.unwrap_err();

        assert!(matches!(
            err,
            CaptionError::Inference {
                status_code: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_generation_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/blip")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let provider = HuggingFaceProvider::new(&server.url(), None, "blip");
        let err = provider.caption(&request()).await.unwrap_err();

        assert!(err.to_string().contains("no generated text"));
    }
}
