pub mod gemini;

use serde::Serialize;
use std::future::Future;

pub use gemini::{GeminiClient, GeminiConfig};

/// A hosted generative model seen as a black box: prompt text in, response
/// text out.
pub trait LanguageModel {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Model returned no text")]
    EmptyResponse,
}

impl Serialize for LlmError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
