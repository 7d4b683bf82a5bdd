// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement execution.

use std::sync::Arc;

use tl_ast::{Call, Node, NodeKind, Pos, ValType, VarId};

use crate::error::mismatch;
use crate::tasks::PendingTask;
use crate::{RuntimeDiagnostic, RuntimeError};

use super::Evaluator;

impl Evaluator {
    /// Execute nodes in order. A `return` unwinds as `RuntimeError::Return`.
    pub(super) fn exec_nodes(&mut self, nodes: &[Node]) -> Result<(), RuntimeDiagnostic> {
        for node in nodes {
            self.exec_node(node)?;
        }
        Ok(())
    }

    fn exec_node(&mut self, node: &Node) -> Result<(), RuntimeDiagnostic> {
        match &node.kind {
            // Constants and functions are fully described by the tables.
            NodeKind::ConstDecl(_) | NodeKind::FunDecl(_) => Ok(()),

            NodeKind::VarDecl { var, init } => match init {
                Some(expr) => {
                    let value = self.eval_expr(expr)?;
                    self.write_var(*var, value, node.pos)
                }
                None => Ok(()),
            },

            NodeKind::Block(block) => self.exec_nodes(&block.nodes),

            NodeKind::If { cond, body } => {
                if self.eval_condition(cond, "if condition")? {
                    self.exec_nodes(&body.nodes)?;
                }
                Ok(())
            }

            NodeKind::While { cond, body } => {
                while self.eval_condition(cond, "while condition")? {
                    self.exec_nodes(&body.nodes)?;
                }
                Ok(())
            }

            NodeKind::Return(expr) => {
                let value = self.eval_expr(expr)?;
                Err(RuntimeDiagnostic::new(RuntimeError::Return(tl_ast::ExecutionResult::of(value)), node.pos))
            }

            NodeKind::Assign { var, expr } => {
                let value = self.eval_expr(expr)?;
                self.write_var(*var, value, node.pos)
            }

            NodeKind::CallStmt(call) => self.call(call, node.pos).map(drop),

            NodeKind::Async { target, call } => self.start_task(*target, call, node.pos),

            NodeKind::Await(target) => self.await_task(*target, node.pos),
        }
    }

    fn eval_condition(&mut self, cond: &tl_ast::Expr, context: &str) -> Result<bool, RuntimeDiagnostic> {
        let value = self.eval_expr(cond)?;
        value.as_bool().ok_or_else(|| mismatch(context, ValType::Bool, value.ty(), cond.pos))
    }

    // =========================================================================
    // Async Tasks
    // =========================================================================

    /// Evaluate the arguments here, then run the call on a pool worker.
    fn start_task(&mut self, target: VarId, call: &Call, pos: Pos) -> Result<(), RuntimeDiagnostic> {
        let args = self.eval_args(call, pos)?;
        let env = Arc::clone(&self.env);
        let function = env.function(call.fun).name.clone();
        let target_name = &env.variable(target).name;

        let (sender, task) = PendingTask::channel(function.clone(), pos);
        let mut child = self.spawn_child();
        let fun = call.fun;
        tracing::trace!(target = %target_name, function = %function, "starting async call");
        self.pool.execute(Box::new(move || {
            let result = child.invoke(fun, args, pos);
            child.take_leaks();
            // The awaiter may be gone; the result is then dropped.
            let _ = sender.send(result);
        }));

        match self.tasks_for(target) {
            Some(tasks) => {
                tasks.insert(target, target_name, task);
                Ok(())
            }
            None => Err(RuntimeDiagnostic::new(RuntimeError::UnknownAsyncTarget { name: target_name.clone() }, pos)),
        }
    }

    /// Block until the task stored into `target` finishes, then write its result.
    fn await_task(&mut self, target: VarId, pos: Pos) -> Result<(), RuntimeDiagnostic> {
        let env = Arc::clone(&self.env);
        let variable = env.variable(target);
        let task = self.tasks_for(target).and_then(|tasks| tasks.remove(target)).ok_or_else(|| {
            RuntimeDiagnostic::new(RuntimeError::UnknownAsyncTarget { name: variable.name.clone() }, pos)
        })?;

        let failed = |cause: RuntimeDiagnostic| {
            RuntimeDiagnostic::new(
                RuntimeError::TaskFailed { function: task.function.clone(), cause: Box::new(cause) },
                pos,
            )
        };
        let result = match task.receiver.recv() {
            Ok(Ok(result)) => result,
            Ok(Err(cause)) => return Err(failed(cause)),
            Err(_) => {
                let lost = RuntimeError::Native {
                    function: task.function.clone(),
                    message: "task ended without a result".to_string(),
                };
                return Err(failed(RuntimeDiagnostic::new(lost, task.pos)));
            }
        };

        let value = result.value.ok_or_else(|| {
            mismatch(format!("result of async `{}`", task.function), variable.ty, result.ty, pos)
        })?;
        self.write_var(target, value, pos)
    }
}
