pub mod analysis;
pub mod config;
pub mod db;
pub mod doc_processor;
pub mod error;
pub mod llm;

#[cfg(feature = "gui")]
mod commands;

pub use analysis::{AnalysisOutcome, Analyzer};
pub use config::AnalyzerConfig;
pub use db::Database;
pub use doc_processor::UploadedDocument;
pub use error::AnalyzerError;

#[cfg(feature = "gui")]
pub use commands::run;
