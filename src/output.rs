//! Serialization of extraction results.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::model::ExtractionResult;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert an extraction result to JSON.
pub fn to_json(result: &ExtractionResult, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(result),
        JsonFormat::Compact => serde_json::to_string(result),
    };

    json.map_err(|e| Error::Other(format!("JSON serialization error: {}", e)))
}

/// Convert an extraction result to plain text, one headed section per page.
pub fn to_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    for record in &result.pages {
        if !output.is_empty() {
            output.push('\n');
        }
        let _ = writeln!(output, "--- page {} ---", record.page);
        output.push_str(&record.content);
        if !record.content.ends_with('\n') {
            output.push('\n');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentKind, PageKind, PageRecord};

    fn result() -> ExtractionResult {
        ExtractionResult {
            source: "report.pdf".to_string(),
            kind: DocumentKind::Combined,
            pages: vec![
                PageRecord::new(1, "Intro\n".to_string(), "report.pdf", PageKind::Text),
                PageRecord::new(2, "| a |".to_string(), "report.pdf", PageKind::Scanned),
            ],
        }
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&result(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"kind\": \"combined\""));
        assert!(json.contains("\"source\": \"report.pdf\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&result(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));

        let parsed: ExtractionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.pages[1].kind, PageKind::Scanned);
    }

    #[test]
    fn test_to_text() {
        let text = to_text(&result());
        assert_eq!(text, "--- page 1 ---\nIntro\n\n--- page 2 ---\n| a |\n");
    }

    #[test]
    fn test_to_text_empty() {
        let empty = ExtractionResult {
            source: String::new(),
            kind: DocumentKind::Scanned,
            pages: Vec::new(),
        };
        assert_eq!(to_text(&empty), "");
    }
}
