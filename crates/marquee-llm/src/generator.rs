//! The `TextGenerator` trait and the OpenAI-compatible client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use marquee_core::config::GenerationConfig;
use marquee_core::Result;

use crate::error::LlmError;

/// A text generation backend.
///
/// The chat engine depends on this trait rather than a concrete client so
/// tests can substitute scripted generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
    api_key: String,
}

impl OpenAiGenerator {
    /// Build a client from generation settings and the resolved API key.
    pub fn new(config: &GenerationConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(LlmError::Http)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(LlmError::Http)?;
        let content = extract_content(parsed)?;
        debug!(chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Pull the first choice's content out of a completion response.
fn extract_content(response: ChatCompletionResponse) -> std::result::Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(json: &str) -> ChatCompletionResponse {
        serde_json::from_str(json).unwrap()
    }

    // ---- extract_content ----

    #[test]
    fn test_extract_content_first_choice() {
        let response = make_response(
            r#"{
                "choices": [
                    {"message": {"role": "assistant", "content": "Inception is a 2010 film."}},
                    {"message": {"role": "assistant", "content": "second choice"}}
                ]
            }"#,
        );
        assert_eq!(
            extract_content(response).unwrap(),
            "Inception is a 2010 film."
        );
    }

    #[test]
    fn test_extract_content_no_choices() {
        let response = make_response(r#"{"choices": []}"#);
        assert!(matches!(
            extract_content(response),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn test_extract_content_null_content() {
        let response = make_response(r#"{"choices": [{"message": {"content": null}}]}"#);
        assert!(matches!(
            extract_content(response),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn test_extract_content_whitespace_only() {
        let response = make_response(r#"{"choices": [{"message": {"content": "   \n  "}}]}"#);
        assert!(matches!(
            extract_content(response),
            Err(LlmError::EmptyResponse)
        ));
    }

    // ---- wire shapes ----

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![RequestMessage {
                role: "user",
                content: "Tell me about Inception",
            }],
            temperature: 0.7,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Tell me about Inception");
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_response_ignores_extra_fields() {
        let response = make_response(
            r#"{
                "id": "chatcmpl-abc",
                "object": "chat.completion",
                "usage": {"total_tokens": 42},
                "choices": [{"index": 0, "finish_reason": "stop",
                             "message": {"role": "assistant", "content": "ok"}}]
            }"#,
        );
        assert_eq!(extract_content(response).unwrap(), "ok");
    }

    // ---- constructor ----

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = GenerationConfig {
            base_url: "https://api.openai.com/v1/".to_string(),
            ..GenerationConfig::default()
        };
        let generator = OpenAiGenerator::new(&config, "test-key").unwrap();
        assert_eq!(generator.base_url, "https://api.openai.com/v1");
    }

    // ---- trait object ----

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_generator_as_trait_object() {
        let generator: Box<dyn TextGenerator> = Box::new(CannedGenerator("canned".to_string()));
        let out = generator.generate("anything").await.unwrap();
        assert_eq!(out, "canned");
    }
}
