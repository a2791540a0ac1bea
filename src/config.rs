use std::env;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 3000;
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_PATH: &str = "configurator.db";

/// Settings for the completion provider. The credential is optional here:
/// its presence is only checked at call time, so the server can start (and
/// serve the storage endpoints) without one.
#[derive(Debug, Clone)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: String,
    pub cors_origin: String,
    pub ai: AiSettings,
}

impl ServerConfig {
    /// Gather all settings from the environment once, at startup.
    pub fn from_env() -> Self {
        let ai = AiSettings {
            api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            model: env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens: env::var("ANTHROPIC_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
        };

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            ai,
        }
    }
}
