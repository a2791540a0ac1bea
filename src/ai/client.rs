use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::AiSettings;
use crate::error::ConfiguratorError;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One prompt-in, text-out round trip to a completion provider. No retries,
/// no streaming; a failed call surfaces immediately to the caller.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ConfiguratorError>;
}

pub struct ClaudeClient {
    http: reqwest::Client,
    settings: AiSettings,
}

impl ClaudeClient {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl Completion for ClaudeClient {
    async fn complete(&self, prompt: &str) -> Result<String, ConfiguratorError> {
        // Credential check happens before any network traffic.
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            ConfiguratorError::Configuration(
                "ANTHROPIC_API_KEY is not set in environment variables".to_string(),
            )
        })?;

        let payload = json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConfiguratorError::Transport(response.status().to_string()));
        }

        let body: Value = response.json().await?;
        first_content_text(&body)
    }
}

/// Pull the text of the first content block out of a messages-API response
/// body. A response with no text block is a malformed completion, not a
/// panic.
fn first_content_text(body: &Value) -> Result<String, ConfiguratorError> {
    let text = body
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ConfiguratorError::Completion("response carried no text content block".to_string())
        })?;

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_first_content_block_trimmed() {
        let body = json!({
            "content": [
                { "type": "text", "text": "  {\"a\":1}\n" },
                { "type": "text", "text": "ignored" }
            ]
        });
        assert_eq!(first_content_text(&body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn empty_content_array_is_a_malformed_completion() {
        let body = json!({ "content": [] });
        assert!(matches!(
            first_content_text(&body),
            Err(ConfiguratorError::Completion(_))
        ));
    }

    #[test]
    fn missing_content_key_is_a_malformed_completion() {
        let body = json!({ "error": { "message": "overloaded" } });
        assert!(matches!(
            first_content_text(&body),
            Err(ConfiguratorError::Completion(_))
        ));
    }

    #[test]
    fn non_text_first_block_is_a_malformed_completion() {
        let body = json!({ "content": [{ "type": "tool_use", "id": "t1" }] });
        assert!(matches!(
            first_content_text(&body),
            Err(ConfiguratorError::Completion(_))
        ));
    }
}
