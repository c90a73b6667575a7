use super::classify::{classification_prompt, parse_classification, Classification};
use super::fields::{
    field_check_prompt, parse_field_report, required_fields, FieldReportEntry, FieldReportParse,
    UnparsedReason,
};
use crate::db::models::NewDocument;
use crate::db::Database;
use crate::doc_processor::{self, UploadedDocument};
use crate::error::AnalyzerError;
use crate::llm::{LanguageModel, LlmError};
use serde::Serialize;
use tracing::Instrument;

/// How an analysis run ended. Only `Stored` wrote to the database; `NotStored`
/// keeps the parsed report when the write failed.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    NoExtractableText,
    NoRulesDefined {
        text: String,
        classification: Classification,
    },
    Unparseable {
        text: String,
        classification: Classification,
        raw: String,
        reason: UnparsedReason,
    },
    EmptyReport {
        text: String,
        classification: Classification,
    },
    Stored {
        filename: String,
        text: String,
        classification: Classification,
        report: Vec<FieldReportEntry>,
        document_id: i64,
    },
    NotStored {
        filename: String,
        text: String,
        classification: Classification,
        report: Vec<FieldReportEntry>,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl AnalysisOutcome {
    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisOutcome::NoExtractableText => "no_extractable_text",
            AnalysisOutcome::NoRulesDefined { .. } => "no_rules_defined",
            AnalysisOutcome::Unparseable { .. } => "unparseable",
            AnalysisOutcome::EmptyReport { .. } => "empty_report",
            AnalysisOutcome::Stored { .. } => "stored",
            AnalysisOutcome::NotStored { .. } => "not_stored",
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            AnalysisOutcome::NoExtractableText => Notice::new(
                NoticeLevel::Error,
                "No extractable text found in this PDF. It might be scanned or image-based.",
            ),
            AnalysisOutcome::NoRulesDefined { .. } => Notice::new(
                NoticeLevel::Warning,
                "No required field rules defined for this document type.",
            ),
            AnalysisOutcome::Unparseable { reason, .. } => {
                let why = match reason {
                    UnparsedReason::NoJsonArray => "no JSON array found",
                    UnparsedReason::InvalidJson => "the JSON array is malformed",
                };
                Notice::new(
                    NoticeLevel::Error,
                    format!("Could not parse the model's field report ({why}). Showing raw output."),
                )
            }
            AnalysisOutcome::EmptyReport { .. } => Notice::new(
                NoticeLevel::Warning,
                "The model returned an empty field report. Nothing was saved.",
            ),
            AnalysisOutcome::Stored { filename, .. } => Notice::new(
                NoticeLevel::Success,
                format!("Document '{filename}' saved with detailed reports in database."),
            ),
            AnalysisOutcome::NotStored {
                filename, error, ..
            } => Notice::new(
                NoticeLevel::Error,
                format!("Document '{filename}' was analyzed but could not be saved: {error}"),
            ),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::NoExtractableText => None,
            AnalysisOutcome::NoRulesDefined { text, .. }
            | AnalysisOutcome::Unparseable { text, .. }
            | AnalysisOutcome::EmptyReport { text, .. }
            | AnalysisOutcome::Stored { text, .. }
            | AnalysisOutcome::NotStored { text, .. } => Some(text),
        }
    }

    pub fn classification(&self) -> Option<&Classification> {
        match self {
            AnalysisOutcome::NoExtractableText => None,
            AnalysisOutcome::NoRulesDefined { classification, .. }
            | AnalysisOutcome::Unparseable { classification, .. }
            | AnalysisOutcome::EmptyReport { classification, .. }
            | AnalysisOutcome::Stored { classification, .. }
            | AnalysisOutcome::NotStored { classification, .. } => Some(classification),
        }
    }

    /// The parsed field report; empty unless the field check produced one.
    pub fn report(&self) -> &[FieldReportEntry] {
        match self {
            AnalysisOutcome::Stored { report, .. } | AnalysisOutcome::NotStored { report, .. } => {
                report
            }
            _ => &[],
        }
    }

    pub fn raw_output(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Unparseable { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Result of the field-check stage on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCheck {
    /// The predicted type has no rules; the model was not asked.
    NoRules,
    Checked(FieldReportParse),
}

/// Runs extraction, classification, field checking and persistence for one
/// uploaded document.
pub struct Analyzer<'a, M> {
    model: &'a M,
    db: &'a Database,
}

impl<'a, M> Analyzer<'a, M>
where
    M: LanguageModel + Sync,
{
    pub fn new(model: &'a M, db: &'a Database) -> Self {
        Self { model, db }
    }

    pub async fn classify(&self, text: &str) -> Result<Classification, LlmError> {
        let raw = self.model.generate(&classification_prompt(text)).await?;
        let classification = parse_classification(&raw);
        tracing::info!(
            predicted_type = classification.predicted_type(),
            confidence = ?classification.confidence(),
            "document classified"
        );
        Ok(classification)
    }

    pub async fn check_fields(
        &self,
        predicted_type: &str,
        text: &str,
    ) -> Result<FieldCheck, LlmError> {
        let Some(fields) = required_fields(predicted_type) else {
            tracing::info!(predicted_type, "no field rules for document type");
            return Ok(FieldCheck::NoRules);
        };
        let prompt = field_check_prompt(predicted_type, fields, text);
        let raw = self.model.generate(&prompt).await?;
        Ok(FieldCheck::Checked(parse_field_report(&raw)))
    }

    pub async fn analyze(&self, doc: &UploadedDocument) -> Result<AnalysisOutcome, AnalyzerError> {
        let span = tracing::info_span!("analyze", filename = %doc.filename);
        self.run(doc).instrument(span).await
    }

    async fn run(&self, doc: &UploadedDocument) -> Result<AnalysisOutcome, AnalyzerError> {
        let text = doc_processor::extract_text(&doc.bytes)?;
        if !doc_processor::has_extractable_text(&text) {
            tracing::info!("no extractable text, stopping before classification");
            return Ok(AnalysisOutcome::NoExtractableText);
        }
        tracing::info!(chars = text.chars().count(), "text extracted");

        let classification = self.classify(&text).await?;

        let check = self
            .check_fields(classification.predicted_type(), &text)
            .await?;
        let parsed = match check {
            FieldCheck::NoRules => {
                return Ok(AnalysisOutcome::NoRulesDefined {
                    text,
                    classification,
                })
            }
            FieldCheck::Checked(parsed) => parsed,
        };

        let report = match parsed {
            FieldReportParse::Unparsed { raw, reason } => {
                return Ok(AnalysisOutcome::Unparseable {
                    text,
                    classification,
                    raw,
                    reason,
                })
            }
            FieldReportParse::Parsed(report) if report.is_empty() => {
                return Ok(AnalysisOutcome::EmptyReport {
                    text,
                    classification,
                })
            }
            FieldReportParse::Parsed(report) => report,
        };

        let stored = self.db.insert_document(&NewDocument {
            filename: &doc.filename,
            content: &text,
            predicted_type: Some(classification.predicted_type()),
            report: &report,
        });
        let document_id = match stored {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "could not store analyzed document");
                return Ok(AnalysisOutcome::NotStored {
                    filename: doc.filename.clone(),
                    text,
                    classification,
                    report,
                    error: e.to_string(),
                });
            }
        };

        Ok(AnalysisOutcome::Stored {
            filename: doc.filename.clone(),
            text,
            classification,
            report,
            document_id,
        })
    }
}
