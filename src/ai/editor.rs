use serde_json::Value;

use crate::ai::client::{ClaudeClient, Completion};
use crate::ai::extract;
use crate::ai::prompts::{self, SchemaEditContext};
use crate::config::AiSettings;
use crate::error::ConfiguratorError;

/// Composes prompt building, the completion call, and JSON extraction.
///
/// Holds no mutable state: every operation is a request -> response
/// transformation, and concurrent callers share nothing but the underlying
/// HTTP connection pool.
pub struct JsonEditor {
    backend: Box<dyn Completion>,
}

impl JsonEditor {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            backend: Box::new(ClaudeClient::new(settings)),
        }
    }

    /// Swap in a different completion backend.
    #[cfg(test)]
    pub fn with_backend(backend: Box<dyn Completion>) -> Self {
        Self { backend }
    }

    /// Apply a natural-language command to a serialized JSON document and
    /// return the modified document pretty-printed.
    pub async fn modify_json(
        &self,
        command: &str,
        json_data: &str,
    ) -> Result<String, ConfiguratorError> {
        if command.is_empty() || json_data.is_empty() {
            return Err(ConfiguratorError::Validation(
                "Command and JSON data are required".to_string(),
            ));
        }

        let prompt = prompts::build_json_edit_prompt(command, json_data);
        let completion = self.backend.complete(&prompt).await?;
        log::debug!("Raw completion for JSON edit:\n{completion}");

        let modified = extract::extract_json(&completion)?;
        Ok(serde_json::to_string_pretty(&modified)?)
    }

    /// Apply a natural-language command to a schema/uiSchema/formData
    /// triple. Returns the extracted object as-is; the prompt mandates the
    /// schema/uiSchema/formData/jsFunctions shape, but enforcing it is the
    /// caller's concern. The stated target is not branched on - all three
    /// structures are always requested and returned.
    pub async fn modify_schemas(
        &self,
        ctx: &SchemaEditContext,
    ) -> Result<Value, ConfiguratorError> {
        if ctx.command.is_empty() {
            return Err(ConfiguratorError::Validation(
                "Command is required".to_string(),
            ));
        }

        let prompt = prompts::build_schema_edit_prompt(ctx);
        let completion = self.backend.complete(&prompt).await?;
        log::debug!(
            "Raw completion for schema edit (target '{}'):\n{completion}",
            ctx.target
        );

        extract::extract_json(&completion)
    }
}
