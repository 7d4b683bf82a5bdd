// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compile-time execution of user functions on known arguments.
//!
//! Nothing here rewrites the tree. Any run-time dependency, fault or quota
//! overrun ends the evaluation with [`NotConstant`]; the caller keeps the call.

use std::collections::HashMap;

use tl_ast::{ops, Call, Environment, Expr, ExprKind, FunId, Node, NodeKind, Owner, ValType, Value, VarId};

/// The evaluation could not complete at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NotConstant;

type EvalResult<T> = Result<T, NotConstant>;

// ============================================================================
// Control Flow
// ============================================================================

enum ControlFlow {
    Normal,
    Return(Value),
}

struct Frame {
    fun: FunId,
    slots: HashMap<VarId, Value>,
}

/// A compile-time interpreter over one call.
pub(crate) struct ConstEval<'a> {
    env: &'a Environment,
    globals: HashMap<VarId, Value>,
    frames: Vec<Frame>,
    /// Loop iterations plus calls.
    branch_count: usize,
    branch_quota: usize,
}

impl<'a> ConstEval<'a> {
    pub fn new(env: &'a Environment, globals: HashMap<VarId, Value>, branch_quota: usize) -> Self {
        Self { env, globals, frames: Vec::new(), branch_count: 0, branch_quota }
    }

    /// Globals as left by the evaluation.
    pub fn into_globals(self) -> HashMap<VarId, Value> {
        self.globals
    }

    fn count_branch(&mut self) -> EvalResult<()> {
        self.branch_count += 1;
        if self.branch_count > self.branch_quota {
            tracing::trace!(quota = self.branch_quota, "compile-time evaluation exceeded branch quota");
            Err(NotConstant)
        } else {
            Ok(())
        }
    }

    /// Run a user function on checked arguments. `None` for a function returning nothing.
    pub fn call(&mut self, fun: FunId, args: Vec<Value>) -> EvalResult<Option<Value>> {
        self.count_branch()?;
        let env = self.env;
        let function = env.function(fun);
        let body = function.block().ok_or(NotConstant)?;

        let slots = function.params.iter().map(|p| p.var).zip(args).collect();
        self.frames.push(Frame { fun, slots });
        let flow = self.exec_nodes(&body.nodes);
        self.frames.pop();

        match (flow?, function.ret) {
            (ControlFlow::Normal, ValType::None) => Ok(None),
            (ControlFlow::Return(value), ret) if value.ty() == ret => Ok(Some(value)),
            _ => Err(NotConstant),
        }
    }

    fn exec_nodes(&mut self, nodes: &[Node]) -> EvalResult<ControlFlow> {
        for node in nodes {
            if let ControlFlow::Return(value) = self.exec_node(node)? {
                return Ok(ControlFlow::Return(value));
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_node(&mut self, node: &Node) -> EvalResult<ControlFlow> {
        match &node.kind {
            NodeKind::ConstDecl(_) | NodeKind::FunDecl(_) => Ok(ControlFlow::Normal),
            NodeKind::VarDecl { var, init } => {
                if let Some(expr) = init {
                    let value = self.eval_expr(expr)?;
                    self.write_var(*var, value)?;
                }
                Ok(ControlFlow::Normal)
            }
            NodeKind::Assign { var, expr } => {
                let value = self.eval_expr(expr)?;
                self.write_var(*var, value)?;
                Ok(ControlFlow::Normal)
            }
            NodeKind::Block(block) => self.exec_nodes(&block.nodes),
            NodeKind::If { cond, body } => {
                if self.eval_condition(cond)? {
                    self.exec_nodes(&body.nodes)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }
            NodeKind::While { cond, body } => {
                while self.eval_condition(cond)? {
                    self.count_branch()?;
                    if let ControlFlow::Return(value) = self.exec_nodes(&body.nodes)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
                Ok(ControlFlow::Normal)
            }
            NodeKind::Return(expr) => Ok(ControlFlow::Return(self.eval_expr(expr)?)),
            NodeKind::CallStmt(call) => {
                let function = self.env.function(call.fun);
                // The run-time call keeps the effect of natives that only act on the host.
                if function.is_native() && function.ret == ValType::None {
                    return Ok(ControlFlow::Normal);
                }
                self.eval_call(call)?;
                Ok(ControlFlow::Normal)
            }
            NodeKind::Async { .. } | NodeKind::Await(_) => Err(NotConstant),
        }
    }

    fn eval_condition(&mut self, cond: &Expr) -> EvalResult<bool> {
        self.eval_expr(cond)?.as_bool().ok_or(NotConstant)
    }

    fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::ConstVal(value) => Ok(*value),
            ExprKind::ConstRef(id) => Ok(self.env.constant(*id).value),
            ExprKind::VarRef(var) => self.read_var(*var),
            ExprKind::UnOp { op, operand } => {
                let value = self.eval_expr(operand)?;
                ops::unary(*op, value).map_err(|_| NotConstant)
            }
            ExprKind::BinOp { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                ops::binary(*op, l, r).map_err(|_| NotConstant)
            }
            ExprKind::Call(call) => self.eval_call(call)?.ok_or(NotConstant),
        }
    }

    fn eval_call(&mut self, call: &Call) -> EvalResult<Option<Value>> {
        let function = self.env.function(call.fun);
        if function.is_native() {
            return Err(NotConstant);
        }
        let mut args = Vec::with_capacity(call.args.len());
        for (arg, param) in call.args.iter().zip(&function.params) {
            let value = self.eval_expr(arg)?;
            if !param.ty.accepts(value.ty()) {
                return Err(NotConstant);
            }
            args.push(value);
        }
        self.call(call.fun, args)
    }

    fn read_var(&self, var: VarId) -> EvalResult<Value> {
        let value = match self.env.variable(var).owner {
            Owner::Global => self.globals.get(&var),
            Owner::Function(fun) => self.frame_of(fun).and_then(|frame| frame.slots.get(&var)),
        };
        value.copied().ok_or(NotConstant)
    }

    fn write_var(&mut self, var: VarId, value: Value) -> EvalResult<()> {
        let variable = self.env.variable(var);
        if variable.ty != value.ty() {
            return Err(NotConstant);
        }
        match variable.owner {
            Owner::Global => {
                self.globals.insert(var, value);
            }
            Owner::Function(fun) => {
                let frame = self.frames.iter_mut().rev().find(|frame| frame.fun == fun).ok_or(NotConstant)?;
                frame.slots.insert(var, value);
            }
        }
        Ok(())
    }

    fn frame_of(&self, fun: FunId) -> Option<&Frame> {
        self.frames.iter().rev().find(|frame| frame.fun == fun)
    }
}
