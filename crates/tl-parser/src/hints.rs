// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.
//!
//! Kept separate from the main parser to avoid clutter.

use crate::error::AstErrorKind;

/// Get a hint for an error based on its kind.
pub fn for_error(kind: &AstErrorKind) -> Option<&'static str> {
    match kind {
        AstErrorKind::UnexpectedToken { expected, found } => for_expected(expected, found),
        AstErrorKind::DuplicateIdentifier { .. } => Some("declare it in a nested block to shadow it instead"),
        AstErrorKind::UndefinedIdentifier { .. } => Some("names must be declared before use"),
        AstErrorKind::InvalidParameterList { .. } => Some("syntax: fun name(a: int, b: float): int { ... }"),
        AstErrorKind::InvalidConstantExpression { .. } => {
            Some("constants cannot depend on run-time values; use 'var' instead")
        }
        AstErrorKind::NotAssignable { .. } => Some("only variables declared with 'var' can be assigned"),
        AstErrorKind::ChainedComparison => Some("combine comparisons with 'and' or 'or'"),
        AstErrorKind::AsyncTargetMismatch { .. } => Some("declare the target with the callee's return type"),
        _ => None,
    }
}

fn for_expected(expected: &str, found: &str) -> Option<&'static str> {
    match (expected, found) {
        ("':='", "'='") => Some("assignment uses ':='; '=' compares"),
        ("':'", _) => Some("syntax: name: type"),
        ("a type", _) => Some("types are 'int', 'float' or 'bool'"),
        ("'{'", _) => Some("blocks start with '{'"),
        ("'}'", "end of file") => Some("every '{' needs a matching '}'"),
        ("')'", "end of file") => Some("add ')' to close the parenthesis"),
        ("'('", _) => Some("function calls need parentheses"),
        ("an expression", _) => Some("try a value, variable, or function call"),
        ("a name", "an integer" | "a float") => Some("names can't start with a number"),
        ("a name", _) => Some("names start with a letter or '_'"),
        ("a statement", _) => Some("statements start with a name, '{', 'if', 'while', 'return', 'async' or 'await'"),
        _ => None,
    }
}
