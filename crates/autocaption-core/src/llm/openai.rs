//! OpenAI provider using the Chat Completions API.
//!
//! Sends the image as a data URL in the user message content array.

use super::provider::{http_error, CaptionProvider, CaptionRequest, CaptionResponse};
use crate::error::CaptionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_endpoint(api_key, model, CHAT_COMPLETIONS_URL)
    }

    /// Create against an OpenAI-compatible endpoint.
    pub fn with_endpoint(api_key: &str, model: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CaptionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn caption(&self, request: &CaptionRequest) -> Result<CaptionResponse, CaptionError> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: 0.3,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_url(),
                        },
                    },
                    ChatContent::Text {
                        text: request.prompt.clone(),
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptionError::Inference {
                message: format!("OpenAI request failed: {e}"),
                status_code: None,
            })?;

        if !resp.status().is_success() {
            return Err(http_error("OpenAI", resp).await);
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| CaptionError::Inference {
            message: format!("Failed to parse OpenAI response: {e}"),
            status_code: None,
        })?;

        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CaptionError::Inference {
                message: "OpenAI returned no content".to_string(),
                status_code: None,
            })?;

        Ok(CaptionResponse {
            text,
            model: chat_resp.model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;

    #[tokio::test]
    async fn test_caption_reads_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 60
            })))
            .with_status(200)
            .with_body(
                r#"{"model":"gpt-4o-mini-2024","choices":[{"message":{"content":"Golden hour at the pier."}}]}"#,
            )
            .create_async()
            .await;

        let provider = OpenAiProvider::with_endpoint(
            "sk-test",
            "gpt-4o-mini",
            &format!("{}/v1/chat/completions", server.url()),
        );
        let request = CaptionRequest::new(ImageInput::from_bytes(&[1, 2, 3], "image/jpeg"), 60);
        let response = provider.caption(&request).await.unwrap();

        assert_eq!(response.text, "Golden hour at the pier.");
        assert_eq!(response.model, "gpt-4o-mini-2024");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_failure_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":"bad key"}"#)
            .create_async()
            .await;

        let provider = OpenAiProvider::with_endpoint(
            "sk-wrong",
            "gpt-4o-mini",
            &format!("{}/v1/chat/completions", server.url()),
        );
        let request = CaptionRequest::new(ImageInput::from_bytes(&[1], "image/jpeg"), 10);
        let err = provider.caption(&request).await.unwrap_err();

        assert!(matches!(
            err,
            CaptionError::Inference {
                status_code: Some(401),
                ..
            }
        ));
    }
}
