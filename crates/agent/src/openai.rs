//! OpenAI-compatible chat completions client.
//!
//! Ollama is reached through the same endpoint shape; point `llm.base_url` at its
//! `/v1` prefix.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use replydesk_core::config::{LlmConfig, LlmProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm::{CompletionRequest, LlmClient};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const TEMPERATURE: f64 = 0.3;
pub const MAX_TOKENS: u32 = 1000;

const EMPTY_CONTENT: &str = "{}";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm provider `{0}` cannot build a client")]
    NotConfigured(&'static str),
    #[error("llm http client could not be built: {0}")]
    Client(#[source] reqwest::Error),
    #[error("llm request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("llm endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl OpenAiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if !config.is_configured() {
            return Err(LlmError::NotConfigured(config.provider.as_str()));
        }

        let base_url = match (&config.base_url, config.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmProvider::OpenAi) => OPENAI_BASE_URL.to_string(),
            (None, provider) => return Err(LlmError::NotConfigured(provider.as_str())),
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(LlmError::Client)?;

        Ok(Self { http, api_key: config.api_key.clone(), base_url, model: config.model.clone() })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": &self.model,
            "messages": [
                { "role": "system", "content": &request.system },
                { "role": "user", "content": &request.user }
            ],
            "response_format": { "type": "json_object" },
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        })
    }

    async fn call_api(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut builder = self.http.post(self.endpoint()).json(&self.request_body(request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let completion: ChatCompletion = response.json().await?;
        Ok(completion.into_content())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        Ok(self.call_api(request).await?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

impl ChatCompletion {
    /// First choice's content; absent or empty content reads as an empty JSON object.
    fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| EMPTY_CONTENT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use replydesk_core::config::{AppConfig, LlmProvider};
    use secrecy::SecretString;

    use super::{ChatCompletion, LlmError, OpenAiClient, MAX_TOKENS, OPENAI_BASE_URL};
    use crate::llm::CompletionRequest;

    fn openai_config() -> replydesk_core::config::LlmConfig {
        let mut config = AppConfig::default().llm;
        config.provider = LlmProvider::OpenAi;
        config.api_key = Some(SecretString::from("sk-test".to_string()));
        config
    }

    #[test]
    fn disabled_provider_cannot_build_a_client() {
        let error = OpenAiClient::from_config(&AppConfig::default().llm)
            .expect_err("disabled provider should be rejected");
        assert!(matches!(error, LlmError::NotConfigured("disabled")));
    }

    #[test]
    fn openai_defaults_to_public_endpoint() {
        let client = OpenAiClient::from_config(&openai_config()).expect("client");

        assert_eq!(client.endpoint(), format!("{OPENAI_BASE_URL}/chat/completions"));
        assert_eq!(client.model(), "gpt-4o-mini");
        assert!(!format!("{client:?}").contains("sk-test"));
    }

    #[test]
    fn ollama_uses_configured_base_url() {
        let mut config = AppConfig::default().llm;
        config.provider = LlmProvider::Ollama;
        config.base_url = Some("http://localhost:11434/v1/".to_string());
        config.model = "llama3.1".to_string();

        let client = OpenAiClient::from_config(&config).expect("client");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn request_body_asks_for_json_output() {
        let client = OpenAiClient::from_config(&openai_config()).expect("client");
        let body = client.request_body(&CompletionRequest {
            system: "system prompt".to_string(),
            user: "Customer ticket:\nhello".to_string(),
        });

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["max_tokens"], MAX_TOKENS);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Customer ticket:\nhello");
    }

    #[test]
    fn missing_content_reads_as_empty_object() {
        let empty: ChatCompletion = serde_json::from_str(r#"{"choices": []}"#).expect("decode");
        assert_eq!(empty.into_content(), "{}");

        let null_content: ChatCompletion =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#)
                .expect("decode");
        assert_eq!(null_content.into_content(), "{}");

        let content: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"status\":\"success\"}"}}]}"#,
        )
        .expect("decode");
        assert_eq!(content.into_content(), r#"{"status":"success"}"#);
    }
}
