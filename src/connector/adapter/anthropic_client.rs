use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::application::ChatClient;
use crate::domain::{ChatRequest, DomainError};

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(serde::Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// HTTP client for the Anthropic Messages API (and compatible endpoints such as
/// LM Studio).
///
/// System turns of a [`ChatRequest`] are lifted into the top-level `system`
/// field; the remaining turns are sent as `messages` in order.
///
/// ```text
/// ANTHROPIC_BASE_URL=http://localhost:1234
/// ANTHROPIC_API_KEY=sk-ant-...
/// ANTHROPIC_MODEL=claude-3-5-haiku-latest
/// ```
///
/// Before each request the client sends a lightweight `HEAD /` probe with a
/// 2-second timeout, so an unreachable server fails fast instead of waiting
/// out the full request timeout.
pub struct AnthropicClient {
    client: reqwest::Client,
    probe_client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base: String = base_url.into();
        let trimmed = base.trim_end_matches('/');
        let url = format!("{trimmed}{MESSAGES_PATH}");
        let base_url = format!("{trimmed}/");
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            probe_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(2))
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            url,
            base_url,
        }
    }

    /// | Variable             | Default                     |
    /// |----------------------|-----------------------------|
    /// | `ANTHROPIC_BASE_URL` | `https://api.anthropic.com` |
    /// | `ANTHROPIC_MODEL`    | `claude-3-5-haiku-latest`   |
    /// | `ANTHROPIC_API_KEY`  | `""` (local servers)        |
    pub fn from_env() -> Self {
        let base = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_ANTHROPIC_BASE_URL.to_string());
        let model =
            std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        Self::new(key, model, base)
    }

    fn build_request<'a>(&'a self, request: &'a ChatRequest) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system_prompt(),
            messages: request
                .conversation()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, DomainError> {
        // Any HTTP response to the probe, even 4xx/5xx, means the server is up.
        match self.probe_client.head(&self.base_url).send().await {
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Err(DomainError::provider(format!(
                    "AnthropicClient: server not reachable at {}: {e}",
                    self.base_url.trim_end_matches('/')
                )));
            }
            _ => {}
        }

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| DomainError::provider(format!("AnthropicClient: request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("AnthropicClient: API returned {status}: {body}");
            return Err(DomainError::provider(format!(
                "AnthropicClient: API returned {status}"
            )));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            DomainError::provider(format!("AnthropicClient: failed to parse response: {e}"))
        })?;

        Ok(api_response
            .content
            .into_iter()
            .next()
            .map(|b| b.text)
            .unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatMessage;

    #[test]
    fn test_system_turns_move_to_system_field() {
        let client = AnthropicClient::new("", "local-model", "http://localhost:1234");
        let request = ChatRequest::new(
            vec![
                ChatMessage::system("documents here"),
                ChatMessage::user("earlier"),
                ChatMessage::assistant("reply"),
                ChatMessage::user("now"),
            ],
            1000,
            0.7,
        );

        let json = serde_json::to_value(client.build_request(&request)).unwrap();

        assert_eq!(json["system"], "documents here");
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "now");
    }

    #[test]
    fn test_request_without_system_omits_field() {
        let client = AnthropicClient::new("", "m", "http://localhost:1234/");
        let request = ChatRequest::new(vec![ChatMessage::user("hi")], 10, 0.0);

        let json = serde_json::to_value(client.build_request(&request)).unwrap();

        assert!(json.get("system").is_none());
        assert_eq!(client.url, "http://localhost:1234/v1/messages");
    }
}
