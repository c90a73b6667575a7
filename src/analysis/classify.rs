use serde::Serialize;

/// Document types the classifier may choose from.
pub const CANDIDATE_LABELS: [&str; 3] = ["invoice", "contract", "report"];

/// Result of parsing the classifier's free-text answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    /// The answer had the expected `<label>, <number>` shape.
    Labeled { label: String, confidence: f64 },
    /// Anything else: the whole trimmed answer is taken as the label and the
    /// confidence is unknown.
    Fallback { label: String },
}

impl Classification {
    /// The predicted type, verbatim. This is the key used for field rules.
    pub fn predicted_type(&self) -> &str {
        match self {
            Classification::Labeled { label, .. } | Classification::Fallback { label } => label,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Classification::Labeled { confidence, .. } => Some(*confidence),
            Classification::Fallback { .. } => None,
        }
    }

    pub fn display_label(&self) -> String {
        self.predicted_type().to_uppercase()
    }
}

pub fn classification_prompt(text: &str) -> String {
    let labels = CANDIDATE_LABELS
        .iter()
        .map(|l| format!("'{l}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Classify the following document into one of these categories: [{labels}].\n\
         Respond in this format: <category_name>, <confidence_percent_as_number>\n\
         \n\
         Document text: {text}\n"
    )
}

/// Parse `<label>, <confidence>`. Exactly one comma is expected; any other
/// shape, or a confidence that is not a number, degrades to `Fallback`.
pub fn parse_classification(raw: &str) -> Classification {
    let output = raw.trim();
    let parts: Vec<&str> = output.split(',').map(str::trim).collect();

    if let [label, confidence] = parts.as_slice() {
        if let Ok(confidence) = confidence.parse::<f64>() {
            return Classification::Labeled {
                label: label.to_string(),
                confidence,
            };
        }
    }

    tracing::warn!(response = output, "classification response not in `<label>, <number>` form");
    Classification::Fallback {
        label: output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_and_confidence() {
        let c = parse_classification("invoice, 92.5");
        assert_eq!(
            c,
            Classification::Labeled {
                label: "invoice".into(),
                confidence: 92.5
            }
        );
        assert_eq!(c.confidence(), Some(92.5));
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let c = parse_classification("\n  contract ,  80 \n");
        assert_eq!(c.predicted_type(), "contract");
        assert_eq!(c.confidence(), Some(80.0));
    }

    #[test]
    fn test_no_comma_falls_back() {
        let c = parse_classification("invoice");
        assert_eq!(
            c,
            Classification::Fallback {
                label: "invoice".into()
            }
        );
        assert_eq!(c.confidence(), None);
    }

    #[test]
    fn test_wrong_arity_falls_back_to_whole_text() {
        let c = parse_classification("foo, bar, baz");
        assert_eq!(c.predicted_type(), "foo, bar, baz");
        assert_eq!(c.confidence(), None);
    }

    #[test]
    fn test_non_numeric_confidence_falls_back() {
        let c = parse_classification("invoice, 92.5%");
        assert_eq!(c.predicted_type(), "invoice, 92.5%");
        assert!(matches!(c, Classification::Fallback { .. }));
    }

    #[test]
    fn test_label_case_is_kept() {
        let c = parse_classification("Invoice, 70");
        assert_eq!(c.predicted_type(), "Invoice");
        assert_eq!(c.display_label(), "INVOICE");
    }

    #[test]
    fn test_prompt_lists_labels_and_text() {
        let prompt = classification_prompt("Total due: $40");
        assert!(prompt.contains("['invoice', 'contract', 'report']"));
        assert!(prompt.contains("<category_name>, <confidence_percent_as_number>"));
        assert!(prompt.ends_with("Document text: Total due: $40\n"));
    }
}
