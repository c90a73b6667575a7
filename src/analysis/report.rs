use super::fields::FieldReportEntry;
use serde::Serialize;

pub const COLUMNS: [&str; 5] = ["field", "status", "value", "priority", "recommendation"];

const FLAG_ON: &str = "\x1b[41;97m";
const FLAG_OFF: &str = "\x1b[0m";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub cells: [String; 5],
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub columns: [&'static str; 5],
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn from_entries(entries: &[FieldReportEntry]) -> Self {
        let rows = entries
            .iter()
            .map(|e| ReportRow {
                cells: [
                    e.field.clone(),
                    e.status.clone(),
                    e.value.clone(),
                    e.priority.clone(),
                    e.recommendation.clone(),
                ],
                flagged: e.is_critical_missing(),
            })
            .collect();
        Self {
            columns: COLUMNS,
            rows,
        }
    }

    pub fn flagged_count(&self) -> usize {
        self.rows.iter().filter(|r| r.flagged).count()
    }

    /// Aligned plain-text table. Flagged rows carry a `!` marker and, with
    /// `color`, an ANSI red background.
    pub fn render_text(&self, color: bool) -> String {
        let cells: Vec<[String; 5]> = self
            .rows
            .iter()
            .map(|r| r.cells.clone().map(|c| single_line(&c)))
            .collect();

        let mut widths = self.columns.map(|c| c.chars().count());
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let header = self.columns.map(String::from);
        out.push_str(&format_line(' ', &header, &widths));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format!("  {}\n", rule.join("-+-")));

        for (row, line_cells) in self.rows.iter().zip(cells.iter()) {
            let marker = if row.flagged { '!' } else { ' ' };
            let line = format_line(marker, line_cells, &widths);
            if row.flagged && color {
                out.push_str(FLAG_ON);
                out.push_str(&line);
                out.push_str(FLAG_OFF);
            } else {
                out.push_str(&line);
            }
            out.push('\n');
        }
        out
    }
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_line(marker: char, cells: &[String; 5], widths: &[usize; 5]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(c, w)| format!("{c:<w$}", w = *w))
        .collect();
    format!("{marker} {}", padded.join(" | ")).trim_end().to_string()
}

/// Indented JSON of the full report, as offered for download.
pub fn report_json(entries: &[FieldReportEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

pub fn report_filename(original: &str) -> String {
    format!("{original}_report.json")
}
