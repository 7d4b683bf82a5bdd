// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Value types and runtime values.

use std::fmt;

/// The static type tag of a declaration or a runtime value.
///
/// `Any` is only legal in extern function parameter signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValType {
    None,
    Any,
    Bool,
    Int,
    Float,
}

impl ValType {
    /// Whether a value of type `actual` may be bound where `self` is expected.
    pub fn accepts(self, actual: ValType) -> bool {
        self == ValType::Any || self == actual
    }

    pub fn name(self) -> &'static str {
        match self {
            ValType::None => "none",
            ValType::Any => "any",
            ValType::Bool => "bool",
            ValType::Int => "int",
            ValType::Float => "float",
        }
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value. The language has no heap, so values are plain data.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn ty(&self) -> ValType {
        match self {
            Value::Bool(_) => ValType::Bool,
            Value::Int(_) => ValType::Int,
            Value::Float(_) => ValType::Float,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view with int promoted to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Bool(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

/// What every evaluated node yields: a type tag and an optional value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionResult {
    pub ty: ValType,
    pub value: Option<Value>,
}

impl ExecutionResult {
    /// `(none, null)`: the result of statements and of blocks without a `return`.
    pub fn none() -> Self {
        Self { ty: ValType::None, value: None }
    }

    pub fn of(value: Value) -> Self {
        Self { ty: value.ty(), value: Some(value) }
    }
}

impl From<Option<Value>> for ExecutionResult {
    fn from(value: Option<Value>) -> Self {
        value.map(ExecutionResult::of).unwrap_or_else(ExecutionResult::none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_accepts_everything_else_is_exact() {
        assert!(ValType::Any.accepts(ValType::Bool));
        assert!(ValType::Int.accepts(ValType::Int));
        assert!(!ValType::Float.accepts(ValType::Int));
        assert!(!ValType::Int.accepts(ValType::None));
    }

    #[test]
    fn float_display_keeps_a_fraction() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
