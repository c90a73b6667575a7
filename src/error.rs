use crate::config::ConfigError;
use crate::doc_processor::ExtractError;
use crate::llm::LlmError;
use serde::Serialize;

/// Errors that stop an analysis run before it produces an outcome.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),
}

impl Serialize for AnalyzerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
