use super::AppState;
use crate::analysis::report::{report_filename, report_json, ReportTable};
use crate::analysis::{AnalysisOutcome, Analyzer, FieldReportEntry, Notice};
use crate::db::models::StoredDocument;
use crate::doc_processor::UploadedDocument;
use crate::error::AnalyzerError;
use serde::Serialize;
use tauri::State;
use tauri_plugin_dialog::DialogExt;

/// Everything the page needs to render one analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisView {
    pub outcome: &'static str,
    pub notice: Notice,
    pub text: Option<String>,
    pub predicted_type: Option<String>,
    pub confidence: Option<f64>,
    pub table: Option<ReportTable>,
    pub report: Vec<FieldReportEntry>,
    pub raw_output: Option<String>,
    pub report_filename: Option<String>,
}

impl AnalysisView {
    fn new(filename: &str, outcome: &AnalysisOutcome) -> Self {
        let report = outcome.report().to_vec();
        let has_report = !report.is_empty();
        Self {
            outcome: outcome.kind(),
            notice: outcome.notice(),
            text: outcome.text().map(str::to_string),
            predicted_type: outcome
                .classification()
                .map(|c| c.predicted_type().to_string()),
            confidence: outcome.classification().and_then(|c| c.confidence()),
            table: has_report.then(|| ReportTable::from_entries(&report)),
            raw_output: outcome.raw_output().map(str::to_string),
            report_filename: has_report.then(|| report_filename(filename)),
            report,
        }
    }
}

#[tauri::command]
pub async fn analyze_document(
    state: State<'_, AppState>,
    filename: String,
    bytes: Vec<u8>,
) -> Result<AnalysisView, AnalyzerError> {
    let doc = UploadedDocument::new(filename, bytes);
    let analyzer = Analyzer::new(&state.model, &state.db);
    let outcome = analyzer.analyze(&doc).await.inspect_err(|e| {
        tracing::error!(error = %e, "analysis failed");
    })?;
    Ok(AnalysisView::new(&doc.filename, &outcome))
}

/// Ask where to save the checklist, then write it. Returns the chosen path,
/// or `None` if the dialog was cancelled.
#[tauri::command]
pub async fn save_report(
    app: tauri::AppHandle,
    filename: String,
    report: Vec<FieldReportEntry>,
) -> Result<Option<String>, String> {
    let json = report_json(&report).map_err(|e| e.to_string())?;
    let picked = app
        .dialog()
        .file()
        .set_file_name(report_filename(&filename))
        .add_filter("JSON", &["json"])
        .blocking_save_file();

    let Some(picked) = picked else {
        return Ok(None);
    };
    let path = picked.into_path().map_err(|e| e.to_string())?;
    std::fs::write(&path, json).map_err(|e| e.to_string())?;
    tracing::info!(path = %path.display(), "report saved");
    Ok(Some(path.display().to_string()))
}

#[tauri::command]
pub fn list_documents(state: State<'_, AppState>) -> Result<Vec<StoredDocument>, String> {
    state.db.list_documents().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Classification;

    fn classification() -> Classification {
        Classification::Labeled {
            label: "invoice".into(),
            confidence: 92.5,
        }
    }

    fn entry() -> FieldReportEntry {
        FieldReportEntry {
            field: "amount".into(),
            status: "MISSING".into(),
            value: String::new(),
            priority: "critical".into(),
            recommendation: "add total".into(),
        }
    }

    #[test]
    fn test_view_with_report_offers_table_and_download() {
        let outcome = AnalysisOutcome::Stored {
            filename: "bill.pdf".into(),
            text: "Invoice".into(),
            classification: classification(),
            report: vec![entry()],
            document_id: 1,
        };
        let view = AnalysisView::new("bill.pdf", &outcome);
        assert_eq!(view.outcome, "stored");
        assert_eq!(view.report_filename.as_deref(), Some("bill.pdf_report.json"));
        let table = view.table.unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].flagged);
        assert_eq!(view.predicted_type.as_deref(), Some("invoice"));
        assert_eq!(view.confidence, Some(92.5));
    }

    #[test]
    fn test_view_keeps_report_when_not_stored() {
        let outcome = AnalysisOutcome::NotStored {
            filename: "bill.pdf".into(),
            text: "Invoice".into(),
            classification: classification(),
            report: vec![entry()],
            error: "disk full".into(),
        };
        let view = AnalysisView::new("bill.pdf", &outcome);
        assert!(view.table.is_some());
        assert_eq!(view.report.len(), 1);
        assert_eq!(view.report_filename.as_deref(), Some("bill.pdf_report.json"));
    }

    #[test]
    fn test_view_without_report_hides_table_and_download() {
        let outcome = AnalysisOutcome::Unparseable {
            text: "Invoice".into(),
            classification: classification(),
            raw: "no idea".into(),
            reason: crate::analysis::fields::UnparsedReason::NoJsonArray,
        };
        let view = AnalysisView::new("bill.pdf", &outcome);
        assert!(view.table.is_none());
        assert!(view.report_filename.is_none());
        assert!(view.report.is_empty());
        assert_eq!(view.raw_output.as_deref(), Some("no idea"));

        let view = AnalysisView::new("scan.pdf", &AnalysisOutcome::NoExtractableText);
        assert!(view.text.is_none());
        assert!(view.predicted_type.is_none());
        assert!(view.table.is_none());
    }
}
