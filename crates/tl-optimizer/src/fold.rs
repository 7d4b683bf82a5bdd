// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression folding.

use std::collections::HashMap;

use tl_ast::{ops, Call, Expr, ExprKind, Pos, Value};

use crate::consteval::ConstEval;
use crate::effects::{expr_has_call, has_side_effects};
use crate::error::{op_failure, Bail, OptimizeError};
use crate::stmt::Pass;

/// A subtree whose value is known at compile time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Folded {
    pub value: Value,
    /// False when producing the value runs a call that must stay in the tree.
    pub elidable: bool,
}

impl Folded {
    fn constant(value: Value) -> Self {
        Self { value, elidable: true }
    }
}

pub(crate) type Fold = Result<Folded, Bail>;

/// Outcome of a call evaluated at compile time. `value` is `None` for a
/// function returning nothing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallFold {
    pub value: Option<Value>,
    pub elidable: bool,
}

impl Pass<'_> {
    pub(crate) fn fold_expr(&mut self, expr: &mut Expr) -> Fold {
        let pos = expr.pos;
        match &mut expr.kind {
            ExprKind::ConstVal(value) => Ok(Folded::constant(*value)),
            ExprKind::ConstRef(id) => Ok(Folded::constant(self.env.constant(*id).value)),
            ExprKind::VarRef(var) => {
                if self.constant_only {
                    return Err(Bail::NotConstant);
                }
                self.tracked.get(*var).map(Folded::constant).ok_or(Bail::NotConstant)
            }
            ExprKind::UnOp { op, operand } => {
                let inner = self.fold_operand(operand)?;
                let value = ops::unary(*op, inner.value).map_err(|err| op_failure(err, pos))?;
                Ok(Folded { value, elidable: inner.elidable })
            }
            ExprKind::BinOp { op, left, right } => {
                let l = self.fold_operand(left)?;
                let r = self.fold_operand(right)?;
                let value = ops::binary(*op, l.value, r.value).map_err(|err| op_failure(err, pos))?;
                Ok(Folded { value, elidable: l.elidable && r.elidable })
            }
            ExprKind::Call(call) => {
                let folded = self.fold_call(call, pos)?;
                let value = folded.value.ok_or(Bail::NotConstant)?;
                Ok(Folded { value, elidable: folded.elidable })
            }
        }
    }

    fn fold_operand(&mut self, operand: &mut Expr) -> Fold {
        let folded = self.fold_expr(operand)?;
        self.replace(operand, folded);
        Ok(folded)
    }

    /// Fold a whole expression slot: condition, initializer, argument, return value.
    ///
    /// `None` means unknown; the slot keeps whatever its operands folded to.
    /// In constant-only mode the bail propagates instead.
    pub(crate) fn fold_slot(&mut self, expr: &mut Expr) -> Result<Option<Folded>, Bail> {
        match self.fold_expr(expr) {
            Ok(folded) => {
                self.replace(expr, folded);
                Ok(Some(folded))
            }
            Err(Bail::NotConstant) if !self.constant_only => {
                // Calls past the bail point were not followed.
                if expr_has_call(expr) {
                    self.tracked.forget_globals(self.env);
                }
                Ok(None)
            }
            Err(bail) => Err(bail),
        }
    }

    fn replace(&mut self, expr: &mut Expr, folded: Folded) {
        if !folded.elidable || expr.as_literal().is_some() {
            return;
        }
        if matches!(expr.kind, ExprKind::Call(_)) {
            self.stats.elided_calls += 1;
        } else {
            self.stats.folded_exprs += 1;
        }
        *expr = Expr::literal(folded.value, expr.pos);
    }

    /// Fold a call's arguments and, when they are all known, run the callee.
    pub(crate) fn fold_call(&mut self, call: &mut Call, pos: Pos) -> Result<CallFold, Bail> {
        let mut args = Vec::with_capacity(call.args.len());
        let mut args_known = true;
        let mut args_elidable = true;
        for arg in &mut call.args {
            match self.fold_slot(arg)? {
                Some(folded) => {
                    args.push(folded.value);
                    args_elidable &= folded.elidable;
                }
                None => args_known = false,
            }
        }

        let env = &*self.env;
        let function = env.function(call.fun);
        if function.is_native() {
            return Err(Bail::NotConstant);
        }
        let in_progress = self.folding.contains(&call.fun);
        let impure = in_progress || has_side_effects(env, call.fun);
        if !args_known || in_progress || (impure && self.constant_only) {
            if impure {
                self.tracked.forget_globals(env);
            }
            return Err(Bail::NotConstant);
        }

        for (value, param) in args.iter().zip(&function.params) {
            if !param.ty.accepts(value.ty()) {
                let context = format!("argument `{}` of `{}`", env.variable(param.var).name, function.name);
                return Err(OptimizeError::mismatch(context, param.ty, value.ty(), pos).into());
            }
        }

        // Inside a loop copy no variable value is known, globals included.
        let globals = if self.constant_only { HashMap::new() } else { self.tracked.globals(env) };
        let mut eval = ConstEval::new(env, globals, self.branch_quota);
        match eval.call(call.fun, args) {
            Ok(value) => {
                if impure {
                    self.tracked.commit_globals(eval.into_globals());
                }
                Ok(CallFold { value, elidable: !impure && args_elidable })
            }
            Err(_) => {
                tracing::trace!(function = %function.name, %pos, "call not evaluable at compile time");
                if impure {
                    self.tracked.forget_globals(env);
                }
                Err(Bail::NotConstant)
            }
        }
    }
}
