// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runtime errors. Every one of them is fatal to the run.

use thiserror::Error;
use tl_ast::{ExecutionResult, OpError, Pos, ValType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("{context}: expected `{expected}`, found `{found}`")]
    TypeMismatch { context: String, expected: ValType, found: ValType },

    #[error("variable `{name}` is read before it is assigned")]
    UninitializedVariable { name: String },

    #[error("no pending async call stores into `{name}`")]
    UnknownAsyncTarget { name: String },

    #[error("division by zero; check divisor before dividing")]
    DivisionByZero,

    #[error("integer overflow in `{op}`")]
    Overflow { op: &'static str },

    #[error(transparent)]
    InvalidOperands(OpError),

    #[error("native function `{function}` failed: {message}")]
    Native { function: String, message: String },

    #[error("async call to `{function}` failed: {cause}")]
    TaskFailed { function: String, cause: Box<RuntimeDiagnostic> },

    #[error("`{name}` takes {expected} argument{}, got {found}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch { name: String, expected: usize, found: usize },

    // Control flow (not an actual error)
    #[error("return")]
    Return(ExecutionResult),
}

impl From<OpError> for RuntimeError {
    fn from(err: OpError) -> Self {
        match err {
            OpError::DivisionByZero => RuntimeError::DivisionByZero,
            OpError::Overflow(op) => RuntimeError::Overflow { op },
            other => RuntimeError::InvalidOperands(other),
        }
    }
}

/// A runtime error with the position of the node that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct RuntimeDiagnostic {
    pub error: RuntimeError,
    pub pos: Pos,
}

impl RuntimeDiagnostic {
    pub fn new(error: RuntimeError, pos: Pos) -> Self {
        Self { error, pos }
    }

    /// The innermost diagnostic, following failed async calls down to their cause.
    pub fn root_cause(&self) -> &RuntimeDiagnostic {
        match &self.error {
            RuntimeError::TaskFailed { cause, .. } => cause.root_cause(),
            _ => self,
        }
    }
}

pub(crate) fn mismatch(context: impl Into<String>, expected: ValType, found: ValType, pos: Pos) -> RuntimeDiagnostic {
    RuntimeDiagnostic::new(RuntimeError::TypeMismatch { context: context.into(), expected, found }, pos)
}
