//! OpenAI-compatible chat completion provider.
//!
//! Speaks the `/chat/completions` protocol, including mixed text and image
//! content and the JSON-object output mode.

use super::{
    ChatProvider, FinishReason, GenerationParams, Message, ProviderError, ProviderResponse,
    ResponseFormat,
};
use crate::config::{get_env, get_env_parsed};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Load from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_TIMEOUT_SECS`.
    ///
    /// The API key has no default in any environment.
    pub fn from_env(is_prod: bool) -> Result<Self, AppError> {
        let api_key = get_env("OPENAI_API_KEY", None, is_prod)?;
        if api_key.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "OPENAI_API_KEY is set but empty"
            )));
        }

        Ok(Self {
            api_key: Secret::new(api_key),
            base_url: get_env("OPENAI_BASE_URL", Some(OPENAI_API_BASE), is_prod)?,
            timeout: Duration::from_secs(get_env_parsed(
                "OPENAI_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
                is_prod,
            )?),
        })
    }
}

/// OpenAI chat completion provider.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "OpenAI API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        if status.as_u16() == 429 {
            return ProviderError::RateLimited;
        }

        let error_text = response.text().await.unwrap_or_default();
        ProviderError::ApiError(format!("OpenAI API error {}: {}", status, error_text))
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ChatCompletionRequest {
            model: &params.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            response_format: match params.response_format {
                ResponseFormat::JsonObject => Some(ResponseFormatSpec {
                    kind: "json_object",
                }),
                ResponseFormat::Text => None,
            },
        };

        tracing::debug!(
            model = %params.model,
            message_count = messages.len(),
            json_mode = params.response_format == ResponseFormat::JsonObject,
            "Sending request to OpenAI API"
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let choice = api_response.choices.into_iter().next();

        let finish_reason = match choice.as_ref().and_then(|c| c.finish_reason.as_deref()) {
            Some("stop") | None => FinishReason::Complete,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some(_) => FinishReason::Other,
        };

        let text = choice.and_then(|c| c.message.content);
        let usage = api_response.usage.unwrap_or_default();

        tracing::debug!(
            model = %params.model,
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            finish_reason = ?finish_reason,
            "OpenAI completion received"
        );

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            finish_reason,
        })
    }
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatSpec>,
}

#[derive(Debug, Serialize)]
struct ResponseFormatSpec {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig {
            api_key: Secret::new("sk-test".to_string()),
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn json_params() -> GenerationParams {
        GenerationParams {
            model: "gpt-4o".to_string(),
            temperature: Some(0.2),
            max_tokens: Some(700),
            response_format: ResponseFormat::JsonObject,
        }
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = OpenAiProvider::new(OpenAiConfig {
            api_key: Secret::new("  ".to_string()),
            base_url: OPENAI_API_BASE.to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn complete_sends_json_mode_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "max_tokens": 700,
                "response_format": {"type": "json_object"},
                "messages": [{"role": "system", "content": "analyst"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "{\"season\":\"Autumn\"}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(&[Message::system("analyst")], &json_params())
            .await
            .unwrap();

        assert_eq!(response.text.as_deref(), Some("{\"season\":\"Autumn\"}"));
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.output_tokens, 5);
        assert_eq!(response.finish_reason, FinishReason::Complete);
    }

    #[tokio::test]
    async fn text_mode_omits_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Try the navy blazer."}, "finish_reason": "length"}]
            })))
            .mount(&server)
            .await;

        let params = GenerationParams {
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.7),
            max_tokens: Some(100),
            response_format: ResponseFormat::Text,
        };
        let response = provider(&server)
            .complete(&[Message::user("hi")], &params)
            .await
            .unwrap();

        assert_eq!(response.finish_reason, FinishReason::Length);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("response_format").is_none());
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[tokio::test]
    async fn null_content_becomes_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": null}}]
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(&[Message::user("hi")], &json_params())
            .await
            .unwrap();

        assert_eq!(response.text, None);
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let result = provider(&server)
            .complete(&[Message::user("hi")], &json_params())
            .await;

        assert!(matches!(result, Err(ProviderError::RateLimited)));
    }

    #[tokio::test]
    async fn server_error_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = provider(&server)
            .complete(&[Message::user("hi")], &json_params())
            .await;

        match result {
            Err(ProviderError::ApiError(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected ApiError, got {:?}", other.map(|r| r.text)),
        }
    }
}
