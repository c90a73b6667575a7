use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// One required field of a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequiredField {
    pub field: &'static str,
    pub critical: bool,
}

const fn critical(field: &'static str) -> RequiredField {
    RequiredField {
        field,
        critical: true,
    }
}

const fn optional(field: &'static str) -> RequiredField {
    RequiredField {
        field,
        critical: false,
    }
}

/// Required fields per document type. `report` is a valid label but has no
/// rules.
pub static REQUIRED_FIELDS: &[(&str, &[RequiredField])] = &[
    (
        "invoice",
        &[
            critical("invoice_number"),
            critical("amount"),
            critical("due_date"),
            optional("tax"),
            critical("bill_to"),
            critical("bill_from"),
        ],
    ),
    (
        "contract",
        &[
            critical("party_1"),
            critical("party_2"),
            critical("signature"),
            critical("date"),
            optional("payment_terms"),
        ],
    ),
];

/// Look up the rules for a predicted type. Matching is case-sensitive.
pub fn required_fields(predicted_type: &str) -> Option<&'static [RequiredField]> {
    REQUIRED_FIELDS
        .iter()
        .find(|(label, _)| *label == predicted_type)
        .map(|(_, fields)| *fields)
}

/// One row of the model's field report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReportEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub field: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommendation: String,
}

pub const STATUS_PRESENT: &str = "PRESENT";
pub const STATUS_MISSING: &str = "MISSING";
pub const PRIORITY_CRITICAL: &str = "critical";
pub const PRIORITY_OPTIONAL: &str = "optional";

impl FieldReportEntry {
    pub fn is_missing(&self) -> bool {
        self.status == STATUS_MISSING
    }

    pub fn is_critical(&self) -> bool {
        self.priority == PRIORITY_CRITICAL
    }

    /// A missing critical field blocks acceptance of the document.
    pub fn is_critical_missing(&self) -> bool {
        self.is_missing() && self.is_critical()
    }
}

// Models emit `null`, numbers or booleans where a string was asked for.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsedReason {
    /// Nothing shaped like `[ ... ]` in the response.
    NoJsonArray,
    /// A bracketed span was found but it is not a JSON array of objects.
    InvalidJson,
}

/// Outcome of reading the field report out of a free-text response.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldReportParse {
    Parsed(Vec<FieldReportEntry>),
    Unparsed { raw: String, reason: UnparsedReason },
}

static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Find the first (greedy) `[ ... ]` span in the response and decode it.
pub fn parse_field_report(raw: &str) -> FieldReportParse {
    let raw = raw.trim();
    let Some(m) = JSON_ARRAY.find(raw) else {
        tracing::warn!("no JSON array in field-check response");
        return FieldReportParse::Unparsed {
            raw: raw.to_string(),
            reason: UnparsedReason::NoJsonArray,
        };
    };

    match serde_json::from_str::<Vec<FieldReportEntry>>(m.as_str()) {
        Ok(entries) => FieldReportParse::Parsed(entries),
        Err(e) => {
            tracing::warn!(error = %e, "field-check response held invalid JSON");
            FieldReportParse::Unparsed {
                raw: raw.to_string(),
                reason: UnparsedReason::InvalidJson,
            }
        }
    }
}

pub fn field_check_prompt(predicted_type: &str, fields: &[RequiredField], text: &str) -> String {
    let field_list = fields
        .iter()
        .map(|f| {
            format!(
                "{{'field': '{}', 'critical': {}}}",
                f.field,
                if f.critical { "True" } else { "False" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "The document type is {predicted_type}.\n\
         Required fields with priority (critical or optional): [{field_list}].\n\
         \n\
         For each field, return a JSON array of objects with:\n\
         - \"field\": field name\n\
         - \"status\": either \"PRESENT\" or \"MISSING\"\n\
         - \"value\": extracted text if present, empty if missing\n\
         - \"priority\": \"critical\" or \"optional\"\n\
         - \"recommendation\": specific suggestion to complete or improve this field\n\
         \n\
         Document text: {text}\n"
    )
}
