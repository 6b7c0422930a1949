//! Extraction client: an opaque text-completion call.
//!
//! The trait fixes the contract the pipeline needs (system prompt, user
//! prompt, text out) and the HTTP implementation targets any
//! OpenAI-compatible chat-completions endpoint. No retry policy lives
//! here: a failed call is "zero mentions for this chunk", and callers
//! needing resilience must wrap the client explicitly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use pulse_types::ApiSettings;

use crate::error::TopicsError;

/// Trait for text completion.
///
/// Implementations should enforce their own timeout; the pipeline treats
/// any error other than [`TopicsError::Auth`] as a degraded chunk, while
/// Auth aborts the whole run.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a completion for the given prompts.
    async fn complete(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, TopicsError>;
}

/// Configuration for the chat-completions client.
#[derive(Debug, Clone)]
pub struct ChatApiConfig {
    /// API base URL (e.g. "https://api.groq.com/openai/v1")
    pub base_url: String,
    /// Model name
    pub model: String,
    /// API key
    pub api_key: SecretString,
    /// Request timeout
    pub timeout: Duration,
    /// Completion token cap per call
    pub max_tokens: u32,
}

impl ChatApiConfig {
    /// Build from settings; the API key must be configured.
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, TopicsError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            TopicsError::InvalidConfig(
                "api key not set; configure api.api_key or PULSE_API__API_KEY".to_string(),
            )
        })?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: SecretString::from(api_key),
            timeout: settings.timeout(),
            max_tokens: settings.max_tokens,
        })
    }
}

/// HTTP client for OpenAI-compatible chat-completions endpoints.
pub struct ChatApiClient {
    client: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    /// Create a new client with the configured timeout.
    pub fn new(config: ChatApiConfig) -> Result<Self, TopicsError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TopicsError::InvalidConfig(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionClient for ChatApiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, TopicsError> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatResponseMessage,
        }

        #[derive(Deserialize)]
        struct ChatResponseMessage {
            content: String,
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.1,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TopicsError::Api(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(TopicsError::Auth(format!("HTTP {}: {}", status, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TopicsError::Api(format!("HTTP {}: {}", status, body)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| TopicsError::Parse(e.to_string()))?;

        body.choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| TopicsError::Parse("no choices in response".to_string()))
    }
}

/// A no-op completion client for wiring without an API key.
///
/// Always errors, so every chunk degrades to zero mentions.
pub struct NoOpClient;

#[async_trait]
impl CompletionClient for NoOpClient {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String, TopicsError> {
        Err(TopicsError::InvalidConfig(
            "no completion client configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_key() -> ApiSettings {
        ApiSettings {
            api_key: Some("test-key".to_string()),
            ..ApiSettings::default()
        }
    }

    #[test]
    fn test_config_requires_api_key() {
        let settings = ApiSettings::default();
        assert!(ChatApiConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let mut settings = settings_with_key();
        settings.base_url = "https://api.example.com/v1/".to_string();
        let config = ChatApiConfig::from_settings(&settings).unwrap();
        assert_eq!(config.base_url, "https://api.example.com/v1");
    }

    #[tokio::test]
    async fn test_noop_client_always_errors() {
        let result = NoOpClient.complete("system", "user").await;
        assert!(result.is_err());
    }
}
