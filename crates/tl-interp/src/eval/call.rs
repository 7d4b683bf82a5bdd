// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Function calling: argument binding, frames and return checks.

use std::sync::Arc;

use tl_ast::{Call, ExecutionResult, FunId, FunctionBody, NativeCall, Pos, ValType, Value};

use crate::error::mismatch;
use crate::tasks::PendingTasks;
use crate::{RuntimeDiagnostic, RuntimeError};

use super::{Evaluator, Frame};

impl Evaluator {
    /// Call a function from the host side, checking arity and argument types.
    pub fn call_function(&mut self, fun: FunId, args: &[Value]) -> Result<ExecutionResult, RuntimeDiagnostic> {
        let env = Arc::clone(&self.env);
        let function = env.function(fun);
        let pos = function.block().map(|block| block.pos).unwrap_or_default();
        if args.len() != function.params.len() {
            return Err(RuntimeDiagnostic::new(
                RuntimeError::ArityMismatch {
                    name: function.name.clone(),
                    expected: function.params.len(),
                    found: args.len(),
                },
                pos,
            ));
        }
        for (param, value) in function.params.iter().zip(args) {
            self.check_argument(fun, param.var, param.ty, *value, pos)?;
        }
        tracing::trace!(function = %function.name, "host call");
        self.invoke(fun, args.to_vec(), pos)
    }

    pub(super) fn call(&mut self, call: &Call, pos: Pos) -> Result<ExecutionResult, RuntimeDiagnostic> {
        let args = self.eval_args(call, pos)?;
        self.invoke(call.fun, args, pos)
    }

    /// Evaluate the arguments of `call` left to right and check them against the parameters.
    pub(super) fn eval_args(&mut self, call: &Call, pos: Pos) -> Result<Vec<Value>, RuntimeDiagnostic> {
        let env = Arc::clone(&self.env);
        let params = &env.function(call.fun).params;
        let mut args = Vec::with_capacity(call.args.len());
        for (arg, param) in call.args.iter().zip(params) {
            let value = self.eval_expr(arg)?;
            self.check_argument(call.fun, param.var, param.ty, value, pos)?;
            args.push(value);
        }
        Ok(args)
    }

    fn check_argument(
        &self,
        fun: FunId,
        var: tl_ast::VarId,
        ty: ValType,
        value: Value,
        pos: Pos,
    ) -> Result<(), RuntimeDiagnostic> {
        if ty.accepts(value.ty()) {
            return Ok(());
        }
        let context = format!(
            "argument `{}` of `{}`",
            self.env.variable(var).name,
            self.env.function(fun).name
        );
        Err(mismatch(context, ty, value.ty(), pos))
    }

    /// Run a function on already checked arguments.
    pub(super) fn invoke(&mut self, fun: FunId, args: Vec<Value>, pos: Pos) -> Result<ExecutionResult, RuntimeDiagnostic> {
        let env = Arc::clone(&self.env);
        let function = env.function(fun);

        let result = match &function.body {
            FunctionBody::Precompiled(native) => {
                let context = NativeCall { host: self.host.as_ref(), pos };
                let value = native(&context, &args).map_err(|e| {
                    RuntimeDiagnostic::new(
                        RuntimeError::Native { function: function.name.clone(), message: e.message },
                        pos,
                    )
                })?;
                ExecutionResult::from(value)
            }
            FunctionBody::Block(block) => {
                let mut frame =
                    Frame { fun, slots: vec![None; function.local_count], tasks: PendingTasks::default() };
                for (param, value) in function.params.iter().zip(args) {
                    frame.slots[env.variable(param.var).slot] = Some(value);
                }
                self.frames.push(frame);
                let outcome = self.exec_nodes(&block.nodes);
                self.pop_frame();
                match outcome {
                    Ok(()) => ExecutionResult::none(),
                    Err(RuntimeDiagnostic { error: RuntimeError::Return(result), .. }) => result,
                    Err(diag) => return Err(diag),
                }
            }
        };

        // A native declared to return nothing may still hand back a value; it is ignored.
        if function.is_native() && function.ret == ValType::None {
            return Ok(ExecutionResult::none());
        }
        if result.ty != function.ret {
            return Err(mismatch(format!("return value of `{}`", function.name), function.ret, result.ty, pos));
        }
        Ok(result)
    }
}
