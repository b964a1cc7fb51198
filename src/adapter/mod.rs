mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("reqwest error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP request failed with status: {0}")]
    Status(reqwest::StatusCode),
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("generation response has no text")]
    NoText,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}
