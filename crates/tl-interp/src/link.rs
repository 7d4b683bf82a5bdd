// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Linking: exposing one program's globals as externs of another.

use std::sync::{Arc, Mutex, PoisonError};

use tl_ast::{Environment, ExternIdentifier, FunctionBody, GlobalIdentifier, Host, NativeCall, NativeError, NativeFn, Value};

use crate::{Evaluator, RuntimeDiagnostic};

/// Run `env` once and re-express every scope-0 identifier as an extern.
///
/// Variables carry their value after the run as default. User functions
/// become natives that call back into the instantiated module, sharing its
/// globals across calls; they use the module's host, not the caller's.
pub fn export_module(env: Arc<Environment>, host: Arc<dyn Host>) -> Result<Vec<ExternIdentifier>, RuntimeDiagnostic> {
    let mut evaluator = Evaluator::new(Arc::clone(&env), host);
    let report = evaluator.run()?;
    if !report.leaked_tasks.is_empty() {
        tracing::warn!(leaked = report.leaked_tasks.len(), "exported module left async calls pending");
    }

    let mut exports = Vec::with_capacity(env.globals.len());
    let mut module = None;
    for global in &env.globals {
        let ext = match *global {
            GlobalIdentifier::Const(id) => {
                let constant = env.constant(id);
                ExternIdentifier::Constant { name: constant.name.clone(), ty: constant.ty, value: constant.value }
            }
            GlobalIdentifier::Var(id) => {
                let variable = env.variable(id);
                ExternIdentifier::Variable {
                    name: variable.name.clone(),
                    ty: variable.ty,
                    default: evaluator.global_value(id),
                }
            }
            GlobalIdentifier::Fun(id) => {
                let function = env.function(id);
                let params: Vec<_> = function
                    .params
                    .iter()
                    .map(|p| (env.variable(p.var).name.clone(), p.ty))
                    .collect();
                let params = (!params.is_empty()).then_some(params);
                let body = match &function.body {
                    FunctionBody::Precompiled(native) => Arc::clone(native),
                    FunctionBody::Block(_) => {
                        let shared = module.get_or_insert_with(|| Arc::new(Mutex::new(None::<Evaluator>)));
                        let shared = Arc::clone(shared);
                        let body: NativeFn = Arc::new(move |_: &NativeCall<'_>, args: &[Value]| {
                            let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                            let Some(module) = guard.as_mut() else {
                                return Err(NativeError::new("module is not instantiated"));
                            };
                            module
                                .call_function(id, args)
                                .map(|result| result.value)
                                .map_err(|diag| NativeError::new(format!("{} (at {})", diag, diag.pos)))
                        });
                        body
                    }
                };
                ExternIdentifier::Function { name: function.name.clone(), params, ret: function.ret, body }
            }
        };
        exports.push(ext);
    }

    if let Some(shared) = module {
        *shared.lock().unwrap_or_else(PoisonError::into_inner) = Some(evaluator);
    }
    tracing::debug!(exports = exports.len(), "exported module");
    Ok(exports)
}
