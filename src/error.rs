use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfiguratorError {
    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Claude API Error: {0}")]
    Transport(String),

    #[error("Invalid JSON returned from AI. Raw response: {0}...")]
    Extraction(String),

    #[error("Malformed Completion: {0}")]
    Completion(String),

    #[error("Network Error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database Error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection Pool Error: {0}")]
    Pool(#[from] r2d2::Error),
}
