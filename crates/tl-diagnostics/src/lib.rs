// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! tl diagnostics.
//!
//! One diagnostic type for every phase. Lexer, parser, optimizer and
//! evaluator errors are converted through the `ToDiagnostic` trait, so those
//! crates stay free of presentation concerns.

pub mod codes;
pub mod convert;
pub mod formatter;
pub mod json;

use serde::Serialize;
use tl_ast::Pos;

// ============================================================================
// Core Types
// ============================================================================

/// A diagnostic with the context needed to display it.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

/// A labeled source position within a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub pos: Pos,
    pub style: LabelStyle,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Where the problem is (red carets).
    Primary,
    /// Related location (blue dashes).
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A stable code like `P0002`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub String);

// ============================================================================
// Builder API
// ============================================================================

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, code: None, message: message.into(), labels: Vec::new(), notes: Vec::new(), help: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(ErrorCode(code.into()));
        self
    }

    pub fn with_label(mut self, pos: Pos, style: LabelStyle, msg: impl Into<String>) -> Self {
        self.labels.push(Label { pos, style, message: Some(msg.into()) });
        self
    }

    pub fn with_primary(self, pos: Pos, msg: impl Into<String>) -> Self {
        self.with_label(pos, LabelStyle::Primary, msg)
    }

    pub fn with_secondary(self, pos: Pos, msg: impl Into<String>) -> Self {
        self.with_label(pos, LabelStyle::Secondary, msg)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Returns the primary position (first primary label, or first label).
    pub fn primary_pos(&self) -> Option<Pos> {
        self.labels.iter().find(|l| l.style == LabelStyle::Primary).or(self.labels.first()).map(|l| l.pos)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ============================================================================
// Conversion Trait
// ============================================================================

/// Convert a phase error into a displayable diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_label_wins_over_earlier_secondary() {
        let diag = Diagnostic::error("boom")
            .with_secondary(Pos::new(1, 1), "declared here")
            .with_primary(Pos::new(3, 5), "used here");
        assert_eq!(diag.primary_pos(), Some(Pos::new(3, 5)));
        assert!(diag.is_error());
        assert_eq!(Diagnostic::note("n").primary_pos(), None);
    }
}
