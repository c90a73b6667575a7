use crate::analysis::fields::FieldReportEntry;
use serde::{Deserialize, Serialize};

/// A row of the `documents` table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: i64,
    pub filename: String,
    pub content: String,
    pub predicted_type: Option<String>,
    pub field_report: Option<Vec<FieldReportEntry>>,
    pub improvement_report: Option<Vec<FieldReportEntry>>,
}

/// Values for a new row; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub filename: &'a str,
    pub content: &'a str,
    pub predicted_type: Option<&'a str>,
    /// Written to both `field_report` and `improvement_report`.
    pub report: &'a [FieldReportEntry],
}
