//! Anthropic Messages API provider.
//!
//! Configuration (JSON, every field optional):
//! ```json
//! { "api_key": "sk-ant-...", "base_url": "https://api.anthropic.com/v1" }
//! ```
//! Without `api_key` the key is read from `ANTHROPIC_API_KEY`.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use super::factory::ProviderFactory;
use super::secrets::{ApiCredential, CredentialSource};
use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage};

pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const KEY_NAME: &str = "Anthropic API key";

/// Sends moderation prompts to Claude.
pub struct AnthropicProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_credential(ApiCredential::new(api_key, CredentialSource::Programmatic, KEY_NAME))
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        ApiCredential::from_env(ANTHROPIC_API_KEY_ENV, KEY_NAME).map(Self::from_credential)
    }

    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let credential =
            ApiCredential::from_config_or_env(config, "api_key", ANTHROPIC_API_KEY_ENV, KEY_NAME)?;
        let mut provider = Self::from_credential(credential);
        if let Some(url) = config.get("base_url").and_then(JsonValue::as_str) {
            provider = provider.with_base_url(url);
        }
        Ok(provider)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn from_credential(credential: ApiCredential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn build_request(messages: Vec<ChatMessage>, config: &CompletionConfig) -> MessagesRequest {
        let (system, turns): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|m| m.role == "system");

        let system = system
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n\n");

        MessagesRequest {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: (!system.is_empty()).then_some(system),
            messages: turns
                .into_iter()
                .map(|m| Turn {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Turn>,
}

#[derive(Debug, Serialize)]
struct Turn {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<Block>,
    model: String,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a non-success status to a provider error. 5xx stays retryable.
fn status_error(status: StatusCode, headers: &HeaderMap, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthError,
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after: retry_after(headers),
        },
        _ => ProviderError::ApiError {
            status: status.as_u16(),
            message: serde_json::from_str::<ErrorEnvelope>(body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect()),
        },
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = Self::build_request(messages, config);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", API_VERSION)
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| match e.is_timeout() {
                true => ProviderError::Timeout(config.timeout),
                false => ProviderError::HttpError(e.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &headers, &body));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(CompletionResponse {
            content: body.content.into_iter().filter_map(|b| b.text).collect(),
            usage: TokenUsage {
                prompt_tokens: body.usage.input_tokens,
                completion_tokens: body.usage.output_tokens,
            },
            model: body.model,
            stop_reason: body.stop_reason,
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Registered as `"anthropic"`.
pub struct AnthropicProviderFactory;

impl ProviderFactory for AnthropicProviderFactory {
    fn provider_type(&self) -> &'static str {
        "anthropic"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(AnthropicProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if !ApiCredential::is_available(config, "api_key", ANTHROPIC_API_KEY_ENV) {
            return Err(ProviderError::NotConfigured(format!(
                "{KEY_NAME} required: set 'api_key' or {ANTHROPIC_API_KEY_ENV}"
            )));
        }

        match config.get("base_url").and_then(JsonValue::as_str) {
            Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => Err(
                ProviderError::NotConfigured(format!("base_url is not an http(s) URL: {url}")),
            ),
            _ => Ok(()),
        }
    }

    fn description(&self) -> &'static str {
        "Anthropic Claude via the Messages API"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_prompt_sent_out_of_band() {
        let request = AnthropicProvider::build_request(
            vec![
                ChatMessage::system("You moderate posts."),
                ChatMessage::user("COMMUNITY GUIDELINE:\nNo spam"),
            ],
            &CompletionConfig::default(),
        );

        assert_eq!(request.system.as_deref(), Some("You moderate posts."));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.max_tokens, 300);

        let body = serde_json::to_value(&request).unwrap();
        assert!(body["messages"][0]["content"].as_str().unwrap().contains("No spam"));
    }

    #[test]
    fn test_no_system_field_without_system_message() {
        let request = AnthropicProvider::build_request(
            vec![ChatMessage::user("hi")],
            &CompletionConfig::default(),
        );
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_status_mapping() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, &headers, ""),
            ProviderError::AuthError
        ));

        headers.insert(reqwest::header::RETRY_AFTER, "7".parse().unwrap());
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, &headers, ""),
            ProviderError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(7)
        ));

        let overloaded = status_error(
            StatusCode::from_u16(529).unwrap(),
            &HeaderMap::new(),
            r#"{"error": {"type": "overloaded_error", "message": "Overloaded"}}"#,
        );
        assert!(overloaded.is_transient());
        assert!(overloaded.to_string().contains("Overloaded"));

        let bad_request = status_error(StatusCode::BAD_REQUEST, &HeaderMap::new(), "not json");
        assert!(!bad_request.is_transient());
        assert!(bad_request.to_string().contains("not json"));
    }

    #[test]
    fn test_factory_config() {
        let factory = AnthropicProviderFactory;
        assert!(factory.validate_config(&json!({"api_key": "k"})).is_ok());
        assert!(factory
            .validate_config(&json!({"api_key": "k", "base_url": "ftp://x"}))
            .is_err());

        let provider = factory.create(&json!({"api_key": "k"})).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_from_config_reads_key_and_url() {
        let provider = AnthropicProvider::from_config(&json!({
            "api_key": "config-key",
            "base_url": "https://proxy.internal/v1/"
        }))
        .unwrap();

        assert_eq!(provider.base_url, "https://proxy.internal/v1");
        assert_eq!(provider.credential.expose(), "config-key");
        assert_eq!(provider.credential.source(), CredentialSource::Config);
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = AnthropicProvider::new("sk-ant-secret-123");
        let debug = format!("{provider:?}");
        assert!(!debug.contains("sk-ant-secret-123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_health_check_requires_key() {
        assert!(AnthropicProvider::new("key").health_check().await);
        assert!(!AnthropicProvider::new("").health_check().await);
    }
}
