// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Optimizer errors and the bail-out outcome.

use thiserror::Error;
use tl_ast::{OpError, Pos, ValType};

/// A fatal error found while folding. The environment is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct OptimizeError {
    pub kind: OptimizeErrorKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeErrorKind {
    #[error("{context}: expected `{expected}`, found `{found}`")]
    TypeMismatch { context: String, expected: ValType, found: ValType },

    #[error(transparent)]
    InvalidOperands(OpError),
}

impl OptimizeError {
    pub(crate) fn mismatch(context: impl Into<String>, expected: ValType, found: ValType, pos: Pos) -> Self {
        Self { kind: OptimizeErrorKind::TypeMismatch { context: context.into(), expected, found }, pos }
    }
}

/// Why an expression did not fold.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Bail {
    /// The value is not known at compile time. Recovered at the nearest statement.
    NotConstant,
    Fatal(OptimizeError),
}

impl From<OptimizeError> for Bail {
    fn from(err: OptimizeError) -> Self {
        Bail::Fatal(err)
    }
}

/// Map an operator failure on known operands. Faults the runtime would
/// report are left to the runtime.
pub(crate) fn op_failure(err: OpError, pos: Pos) -> Bail {
    match err {
        OpError::DivisionByZero | OpError::Overflow(_) => Bail::NotConstant,
        other => Bail::Fatal(OptimizeError { kind: OptimizeErrorKind::InvalidOperands(other), pos }),
    }
}
