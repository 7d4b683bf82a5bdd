// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Operator semantics.
//!
//! The evaluator and the optimizer both apply operators through this module,
//! so a folded literal is always the value the evaluator would compute.

use std::fmt;

use thiserror::Error;

use crate::{ValType, Value};

/// Binary operators, by precedence group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Relational
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    // Additive
    Add,
    Sub,
    Or,
    Xor,
    // Multiplicative
    Mul,
    Div,
    And,
    // Power
    Pow,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Plus,
    Neg,
    Not,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::NotEq => "<>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::And => "and",
            BinOp::Pow => "^",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq)
    }
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Plus => "+",
            UnOp::Neg => "-",
            UnOp::Not => "not",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Why an operator could not be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("operator `{op}` cannot be applied to `{left}` and `{right}`")]
    TypeMismatch { op: &'static str, left: ValType, right: ValType },
    #[error("operator `{op}` cannot be applied to `{operand}`")]
    UnaryTypeMismatch { op: &'static str, operand: ValType },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in `{0}`")]
    Overflow(&'static str),
}

/// Apply a binary operator to two evaluated operands.
pub fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, OpError> {
    let mismatch = || OpError::TypeMismatch { op: op.symbol(), left: l.ty(), right: r.ty() };
    match op {
        BinOp::And | BinOp::Or | BinOp::Xor => {
            let (Some(a), Some(b)) = (l.as_bool(), r.as_bool()) else {
                return Err(mismatch());
            };
            Ok(Value::Bool(match op {
                BinOp::And => a && b,
                BinOp::Or => a || b,
                _ => a ^ b,
            }))
        }
        BinOp::Eq | BinOp::NotEq => {
            let equal = match (l, r) {
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (Value::Int(a), Value::Int(b)) => a == b,
                _ => {
                    let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
                        return Err(mismatch());
                    };
                    a == b
                }
            };
            Ok(Value::Bool(if op == BinOp::Eq { equal } else { !equal }))
        }
        BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
            let ordering = match (l, r) {
                (Value::Int(a), Value::Int(b)) => a.partial_cmp(&b),
                _ => {
                    let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
                        return Err(mismatch());
                    };
                    a.partial_cmp(&b)
                }
            };
            // NaN compares false against everything.
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Gt => ordering.is_gt(),
                BinOp::LtEq => ordering.is_le(),
                _ => ordering.is_ge(),
            }))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Pow => arithmetic(op, l, r).ok_or_else(mismatch)?,
    }
}

/// Numeric operators. `None` means an operand is not a number.
fn arithmetic(op: BinOp, l: Value, r: Value) -> Option<Result<Value, OpError>> {
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        return Some(int_arithmetic(op, a, b));
    }
    let (a, b) = (l.as_f64()?, r.as_f64()?);
    let x = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        _ => a.powf(b),
    };
    Some(Ok(Value::Float(x)))
}

fn int_arithmetic(op: BinOp, a: i64, b: i64) -> Result<Value, OpError> {
    let overflow = || OpError::Overflow(op.symbol());
    let n = match op {
        BinOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinOp::Div => {
            if b == 0 {
                return Err(OpError::DivisionByZero);
            }
            a.checked_div(b).ok_or_else(overflow)?
        }
        _ => match u32::try_from(b) {
            Ok(exp) => a.checked_pow(exp).ok_or_else(overflow)?,
            // Negative exponents go through float and truncate.
            Err(_) => (a as f64).powf(b as f64) as i64,
        },
    };
    Ok(Value::Int(n))
}

/// Apply a prefix operator.
pub fn unary(op: UnOp, v: Value) -> Result<Value, OpError> {
    match (op, v) {
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOp::Plus, Value::Int(_) | Value::Float(_)) => Ok(v),
        (UnOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or(OpError::Overflow("-")),
        (UnOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        _ => Err(OpError::UnaryTypeMismatch { op: op.symbol(), operand: v.ty() }),
    }
}
