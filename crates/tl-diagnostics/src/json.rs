// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output for machine consumption.
//!
//! Use `--format json` with any `tl` command to get this output.

use serde::Serialize;
use tl_ast::{LineMap, Pos};

use crate::codes::ErrorCodeRegistry;
use crate::{Diagnostic, LabelStyle, Severity};

/// A complete JSON diagnostic report for one command.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub file: String,
    /// Whether no errors were reported.
    pub success: bool,
    /// The phase that produced these diagnostics (`lex`, `parse`, `optimize`, `run`).
    pub phase: String,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// A single diagnostic in JSON form, enriched with source context.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error category (e.g., "Resolution", "Runtime").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    /// Primary source location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// A source location with line/column (1-based).
#[derive(Debug, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    /// The source line text for context.
    pub source_line: String,
}

#[derive(Debug, Serialize)]
pub struct JsonLabel {
    pub role: LabelStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub location: SourceLocation,
}

/// Convert diagnostics to a structured JSON report.
pub fn to_json_report(diagnostics: &[Diagnostic], source: &str, file: &str, phase: &str) -> DiagnosticReport {
    let registry = ErrorCodeRegistry::default();
    let line_map = LineMap::new(source);
    let count = |severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    let error_count = count(Severity::Error);

    DiagnosticReport {
        version: 1,
        file: file.to_string(),
        success: error_count == 0,
        phase: phase.to_string(),
        diagnostics: diagnostics.iter().map(|d| to_json_diagnostic(d, source, &line_map, &registry)).collect(),
        error_count,
        warning_count: count(Severity::Warning),
    }
}

fn to_json_diagnostic(
    diag: &Diagnostic,
    source: &str,
    line_map: &LineMap,
    registry: &ErrorCodeRegistry,
) -> JsonDiagnostic {
    let code = diag.code.as_ref().map(|c| c.0.clone());
    let category = code.as_deref().and_then(|c| registry.get(c)).map(|info| info.category.to_string());

    JsonDiagnostic {
        severity: diag.severity,
        code,
        category,
        message: diag.message.clone(),
        location: diag.primary_pos().map(|pos| locate(pos, source, line_map)),
        labels: diag
            .labels
            .iter()
            .map(|l| JsonLabel { role: l.style, message: l.message.clone(), location: locate(l.pos, source, line_map) })
            .collect(),
        notes: diag.notes.clone(),
        help: diag.help.clone(),
    }
}

fn locate(pos: Pos, source: &str, line_map: &LineMap) -> SourceLocation {
    // End of input carries line 0; report it on the last line.
    let (line, column) = if pos.line == 0 {
        let last = line_map.line_count();
        let len = line_map.line_text(source, last).map_or(0, str::len);
        (last, len as u32 + 1)
    } else {
        (pos.line, pos.column)
    };
    SourceLocation { line, column, source_line: line_map.line_text(source, line).unwrap_or("").to_string() }
}

/// Serialize a diagnostic report to pretty JSON.
pub fn to_json_string(report: &DiagnosticReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_and_locates() {
        let src = "var x: int = 1\nx := y";
        let diags = vec![
            Diagnostic::error("cannot find `y` in any visible scope").with_code("P0003").with_primary(Pos::new(2, 6), "here"),
            Diagnostic::warning("skipped unexpected `)`").with_code("P0050").with_primary(Pos::new(1, 1), "here"),
        ];
        let report = to_json_report(&diags, src, "demo.tl", "parse");
        assert!(!report.success);
        assert_eq!((report.error_count, report.warning_count), (1, 1));

        let first = &report.diagnostics[0];
        assert_eq!(first.category.as_deref(), Some("Resolution"));
        let location = first.location.as_ref().unwrap();
        assert_eq!((location.line, location.column), (2, 6));
        assert_eq!(location.source_line, "x := y");

        let json: serde_json::Value = serde_json::from_str(&to_json_string(&report)).unwrap();
        assert_eq!(json["diagnostics"][0]["severity"], "error");
        assert_eq!(json["diagnostics"][0]["labels"][0]["role"], "primary");
        assert_eq!(json["phase"], "parse");
    }
}
