pub mod classify;
pub mod fields;
pub mod pipeline;
pub mod report;

pub use classify::{parse_classification, Classification};
pub use fields::{parse_field_report, FieldReportEntry, FieldReportParse};
pub use pipeline::{AnalysisOutcome, Analyzer, FieldCheck, Notice, NoticeLevel};
pub use report::{report_filename, report_json, ReportTable};
