// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from phase error types to `Diagnostic`.

use tl_ast::AssertionReport;
use tl_interp::{LeakedTask, RuntimeDiagnostic, RuntimeError};
use tl_optimizer::{OptimizeError, OptimizeErrorKind};
use tl_parser::{AstError, AstErrorKind, ParseWarning};

use crate::{Diagnostic, ToDiagnostic};

// ============================================================================
// Lex Errors
// ============================================================================

impl ToDiagnostic for tl_lexer::LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(format!("unexpected `{}`", self.text))
            .with_code("L0001")
            .with_primary(self.pos(), "not part of any token")
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

impl ToDiagnostic for AstError {
    fn to_diagnostic(&self) -> Diagnostic {
        use AstErrorKind::*;

        let (code, label) = match &self.kind {
            UnexpectedToken { .. } => ("P0001", "unexpected here"),
            DuplicateIdentifier { .. } => ("P0002", "redeclared here"),
            UndefinedIdentifier { .. } => ("P0003", "not found in this scope"),
            InvalidParameterList { .. } => ("P0004", "in this parameter list"),
            InvalidConstantExpression { .. } => ("P0005", "not a compile-time value"),
            TypeMismatch { .. } => ("P0006", "wrong type"),
            InvalidLiteral { .. } => ("P0007", "cannot be represented"),
            NotAssignable { .. } => ("P0008", "cannot assign"),
            NotCallable { .. } => ("P0009", "not a function"),
            ArityMismatch { .. } => ("P0010", "wrong number of arguments"),
            AsyncTargetMismatch { .. } => ("P0011", "target declared here"),
            ChainedComparison => ("P0012", "second comparison"),
            InconsistentFunctionTable { .. } => ("P0013", "declared here"),
            InvalidExternType { .. } => ("P0014", "invalid type"),
        };

        let mut diag = Diagnostic::error(self.kind.to_string()).with_code(code);
        diag = match self.pos {
            Some(pos) => diag.with_primary(pos, label),
            None => diag.with_note("raised while binding the prelude or embedder externs"),
        };
        if let Some(hint) = self.hint() {
            diag = diag.with_help(hint);
        }
        diag
    }
}

impl ToDiagnostic for ParseWarning {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(format!("skipped unexpected `{}`", self.text))
            .with_code("P0050")
            .with_primary(self.pos, "not a declaration or statement")
    }
}

// ============================================================================
// Optimizer Errors
// ============================================================================

impl ToDiagnostic for OptimizeError {
    fn to_diagnostic(&self) -> Diagnostic {
        match &self.kind {
            OptimizeErrorKind::TypeMismatch { context, expected, found } => Diagnostic::error("mismatched types")
                .with_code("O0001")
                .with_primary(self.pos, format!("{}: expected `{}`, found `{}`", context, expected, found))
                .with_note("found while folding constants, before the program ran"),
            OptimizeErrorKind::InvalidOperands(err) => Diagnostic::error(err.to_string())
                .with_code("O0002")
                .with_primary(self.pos, "operands known at compile time")
                .with_note("found while folding constants, before the program ran"),
        }
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

impl ToDiagnostic for RuntimeDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic {
        use RuntimeError::*;

        let pos = self.pos;
        match &self.error {
            TypeMismatch { context, expected, found } => Diagnostic::error("mismatched types")
                .with_code("R0001")
                .with_primary(pos, format!("{}: expected `{}`, found `{}`", context, expected, found)),

            UninitializedVariable { name } => {
                Diagnostic::error(format!("variable `{}` is read before it is assigned", name))
                    .with_code("R0002")
                    .with_primary(pos, "no value yet")
                    .with_help(format!("initialize `{}` where it is declared", name))
            }

            UnknownAsyncTarget { name } => {
                Diagnostic::error(format!("no pending async call stores into `{}`", name))
                    .with_code("R0003")
                    .with_primary(pos, "awaited here")
                    .with_note("each async call can be awaited exactly once")
            }

            DivisionByZero => Diagnostic::error("division by zero")
                .with_code("R0004")
                .with_primary(pos, "divisor is zero")
                .with_help("check the divisor before dividing"),

            Overflow { op } => Diagnostic::error(format!("integer overflow in `{}`", op))
                .with_code("R0005")
                .with_primary(pos, "result does not fit in 64 bits"),

            InvalidOperands(err) => Diagnostic::error(err.to_string())
                .with_code("R0006")
                .with_primary(pos, "invalid operands"),

            Native { function, message } => Diagnostic::error(format!("native function `{}` failed", function))
                .with_code("R0007")
                .with_primary(pos, message.clone()),

            TaskFailed { function, cause } => {
                let root = cause.root_cause();
                Diagnostic::error(format!("async call to `{}` failed", function))
                    .with_code("R0008")
                    .with_primary(pos, "failure surfaced here")
                    .with_secondary(root.pos, root.error.to_string())
            }

            ArityMismatch { .. } => Diagnostic::error(self.error.to_string())
                .with_code("R0009")
                .with_primary(pos, "called here"),

            Return(_) => Diagnostic::error("`return` outside of a function")
                .with_code("R0010")
                .with_primary(pos, "returned here"),
        }
    }
}

impl ToDiagnostic for LeakedTask {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(format!("async call to `{}` was never awaited", self.function))
            .with_code("R0011")
            .with_primary(self.pos, format!("result for `{}` is discarded", self.target))
            .with_help(format!("add `await {}` before the program ends", self.target))
    }
}

// ============================================================================
// Assertions
// ============================================================================

impl ToDiagnostic for AssertionReport {
    fn to_diagnostic(&self) -> Diagnostic {
        if self.passed {
            return Diagnostic::note("assertion passed").with_primary(self.pos, self.message.clone());
        }
        Diagnostic::error("assertion failed").with_code("A0001").with_primary(self.pos, self.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_ast::Pos;

    #[test]
    fn parse_errors_carry_code_and_hint() {
        let err = AstError::undefined("y", Pos::new(2, 7));
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.as_ref().map(|c| c.0.as_str()), Some("P0003"));
        assert_eq!(diag.primary_pos(), Some(Pos::new(2, 7)));
        assert_eq!(diag.help.as_deref(), Some("names must be declared before use"));
    }

    #[test]
    fn unpositioned_errors_get_a_note() {
        let diag = AstError::duplicate("writeLn", None).to_diagnostic();
        assert!(diag.labels.is_empty());
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn failed_tasks_point_at_the_root_cause() {
        let inner = RuntimeDiagnostic::new(RuntimeError::DivisionByZero, Pos::new(3, 12));
        let outer = RuntimeDiagnostic::new(
            RuntimeError::TaskFailed { function: "work".into(), cause: Box::new(inner) },
            Pos::new(7, 1),
        );
        let diag = outer.to_diagnostic();
        assert_eq!(diag.code.as_ref().map(|c| c.0.as_str()), Some("R0008"));
        assert_eq!(diag.labels.len(), 2);
        assert_eq!(diag.labels[1].pos, Pos::new(3, 12));
    }

    #[test]
    fn failed_assertions_are_errors() {
        let report = AssertionReport { passed: false, pos: Pos::new(1, 1), message: "expected 3, got 4".into() };
        assert!(report.to_diagnostic().is_error());
    }
}
