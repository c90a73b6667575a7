use crate::llm::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::llm::GeminiConfig;
use std::path::PathBuf;

/// The only configuration read from the environment (or a `.env` file).
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_DB_FILE: &str = "documents.db";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set. Export it or add it to a .env file.")]
    MissingApiKey,
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub db_path: PathBuf,
    /// Drop and recreate the `documents` table when the process starts.
    pub reset_on_start: bool,
}

impl AnalyzerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            reset_on_start: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_key(std::env::var(API_KEY_VAR).ok())
    }

    fn from_key(key: Option<String>) -> Result<Self, ConfigError> {
        match key {
            Some(k) if !k.trim().is_empty() => Ok(Self::new(k.trim())),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn reset_on_start(mut self, reset: bool) -> Self {
        self.reset_on_start = reset;
        self
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.api_key.clone(),
            base_url: self.api_base_url.clone(),
            model: self.model.clone(),
        }
    }
}
