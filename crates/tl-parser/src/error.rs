// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parse and resolution error types.

use thiserror::Error;
use tl_ast::token::TokenKind;
use tl_ast::{Pos, ValType};

/// A fatal parse or resolution error. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct AstError {
    pub kind: AstErrorKind,
    /// `None` for errors in injected extern identifiers.
    pub pos: Option<Pos>,
}

impl AstError {
    pub fn new(kind: AstErrorKind, pos: Pos) -> Self {
        Self { kind, pos: Some(pos) }
    }

    pub fn unpositioned(kind: AstErrorKind) -> Self {
        Self { kind, pos: None }
    }

    pub fn expected(expected: &str, found: TokenKind, pos: Pos) -> Self {
        Self::new(
            AstErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: found.display_name().to_string(),
            },
            pos,
        )
    }

    pub fn duplicate(name: &str, pos: Option<Pos>) -> Self {
        Self { kind: AstErrorKind::DuplicateIdentifier { name: name.to_string() }, pos }
    }

    pub fn undefined(name: &str, pos: Pos) -> Self {
        Self::new(AstErrorKind::UndefinedIdentifier { name: name.to_string() }, pos)
    }

    /// A suggestion for fixing the error, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        crate::hints::for_error(&self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AstErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("`{name}` is already declared in this scope")]
    DuplicateIdentifier { name: String },

    #[error("cannot find `{name}` in any visible scope")]
    UndefinedIdentifier { name: String },

    #[error("malformed parameter list: {reason}")]
    InvalidParameterList { reason: String },

    #[error("constant `{name}` must be initialized with a literal or another constant of type `{ty}`")]
    InvalidConstantExpression { name: String, ty: ValType },

    #[error("`{name}` is declared as `{expected}` but initialized with `{found}`")]
    TypeMismatch { name: String, expected: ValType, found: ValType },

    #[error("invalid literal `{text}`")]
    InvalidLiteral { text: String },

    #[error("cannot assign to `{name}`: it is not a variable")]
    NotAssignable { name: String },

    #[error("`{name}` is not a function")]
    NotCallable { name: String },

    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch { name: String, expected: usize, found: usize },

    #[error("async target `{target}` has type `{target_ty}` but `{callee}` returns `{ret}`")]
    AsyncTargetMismatch { target: String, target_ty: ValType, callee: String, ret: ValType },

    #[error("comparison operators cannot be chained")]
    ChainedComparison,

    #[error("function table disagrees with identifier `{name}` on its return type")]
    InconsistentFunctionTable { name: String },

    #[error("extern `{name}` cannot have type `{ty}`")]
    InvalidExternType { name: String, ty: ValType },
}

/// A non-fatal diagnostic: a top-level token that starts neither a
/// declaration nor a statement and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub pos: Pos,
    pub text: String,
}
