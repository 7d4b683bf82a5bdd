// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression evaluation.

use tl_ast::{ops, Expr, ExprKind, ValType, Value};

use crate::error::mismatch;
use crate::RuntimeDiagnostic;

use super::Evaluator;

impl Evaluator {
    /// Evaluate an expression to a value. Calls that yield nothing are a type mismatch.
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeDiagnostic> {
        match &expr.kind {
            ExprKind::ConstVal(value) => Ok(*value),
            ExprKind::ConstRef(id) => Ok(self.env.constant(*id).value),
            ExprKind::VarRef(var) => self.read_var(*var, expr.pos),

            ExprKind::UnOp { op, operand } => {
                let value = self.eval_expr(operand)?;
                ops::unary(*op, value).map_err(|e| RuntimeDiagnostic::new(e.into(), expr.pos))
            }

            // Both operands are always evaluated; `and`/`or` do not short-circuit.
            ExprKind::BinOp { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                ops::binary(*op, l, r).map_err(|e| RuntimeDiagnostic::new(e.into(), expr.pos))
            }

            ExprKind::Call(call) => {
                let result = self.call(call, expr.pos)?;
                result.value.ok_or_else(|| {
                    let name = &self.env.function(call.fun).name;
                    mismatch(format!("result of `{}`", name), ValType::Any, result.ty, expr.pos)
                })
            }
        }
    }
}
