// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The boundary between scripts and the embedder.
//!
//! Native functions receive their positional arguments and a [`NativeCall`]
//! giving access to the [`Host`] that owns program I/O.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::{Pos, ValType, Value};

/// I/O surface the evaluator exposes to native functions.
pub trait Host: Send + Sync {
    /// Write one line of program output.
    fn write_line(&self, text: &str);

    /// Read one line of program input, `None` at end of input.
    fn read_line(&self) -> Option<String>;

    /// Record the outcome of an `assert`/`assertEquals` call.
    fn report_assertion(&self, report: AssertionReport);
}

/// Outcome of one assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionReport {
    pub passed: bool,
    pub pos: Pos,
    pub message: String,
}

/// Context handed to a native function on each call.
pub struct NativeCall<'a> {
    pub host: &'a dyn Host,
    /// Position of the call in the script.
    pub pos: Pos,
}

/// Error raised by a native function. Fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// A native callback: positional arguments in, optional value out.
pub type NativeFn = Arc<dyn Fn(&NativeCall<'_>, &[Value]) -> Result<Option<Value>, NativeError> + Send + Sync>;

/// An identifier supplied by the embedder and bound into scope 0.
#[derive(Clone)]
pub enum ExternIdentifier {
    Function {
        name: String,
        /// `None` for a function taking no parameters.
        params: Option<Vec<(String, ValType)>>,
        ret: ValType,
        body: NativeFn,
    },
    Constant {
        name: String,
        ty: ValType,
        value: Value,
    },
    Variable {
        name: String,
        ty: ValType,
        default: Option<Value>,
    },
}

impl ExternIdentifier {
    /// Convenience constructor for a native function.
    pub fn function<F>(name: impl Into<String>, params: &[(&str, ValType)], ret: ValType, body: F) -> Self
    where
        F: Fn(&NativeCall<'_>, &[Value]) -> Result<Option<Value>, NativeError> + Send + Sync + 'static,
    {
        let params = (!params.is_empty())
            .then(|| params.iter().map(|(n, t)| (n.to_string(), *t)).collect());
        ExternIdentifier::Function { name: name.into(), params, ret, body: Arc::new(body) }
    }

    pub fn name(&self) -> &str {
        match self {
            ExternIdentifier::Function { name, .. }
            | ExternIdentifier::Constant { name, .. }
            | ExternIdentifier::Variable { name, .. } => name,
        }
    }
}

impl fmt::Debug for ExternIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternIdentifier::Function { name, params, ret, .. } => f
                .debug_struct("Function")
                .field("name", name)
                .field("params", params)
                .field("ret", ret)
                .finish_non_exhaustive(),
            ExternIdentifier::Constant { name, ty, value } => f
                .debug_struct("Constant")
                .field("name", name)
                .field("ty", ty)
                .field("value", value)
                .finish(),
            ExternIdentifier::Variable { name, ty, default } => f
                .debug_struct("Variable")
                .field("name", name)
                .field("ty", ty)
                .field("default", default)
                .finish(),
        }
    }
}
