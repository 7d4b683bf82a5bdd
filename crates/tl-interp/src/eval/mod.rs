// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The evaluator implementation.
//!
//! A tree-walk evaluator over the resolved AST. Global variables live in one
//! slot vector shared with async tasks; every call to a user function pushes a
//! frame holding its parameters and locals, so recursion never clobbers the
//! caller's state.

mod call;
mod eval_expr;
mod exec_stmt;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tl_ast::{Environment, ExecutionResult, FunId, Host, Owner, Pos, Value, VarId};

use crate::tasks::{LeakedTask, PendingTasks, WorkerPool};
use crate::{RuntimeDiagnostic, RuntimeError};

/// Slots for one invocation of a user function.
#[derive(Debug)]
struct Frame {
    fun: FunId,
    slots: Vec<Option<Value>>,
    /// Async calls into this invocation's locals not awaited yet.
    tasks: PendingTasks,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Value of a top-level `return`, `(none, null)` otherwise.
    pub result: ExecutionResult,
    /// Async calls that were started but never awaited.
    pub leaked_tasks: Vec<LeakedTask>,
}

/// The tree-walk evaluator.
pub struct Evaluator {
    env: Arc<Environment>,
    host: Arc<dyn Host>,
    globals: Arc<Mutex<Vec<Option<Value>>>>,
    /// Call stack, innermost last.
    frames: Vec<Frame>,
    /// Async calls into globals, plus every leak recorded so far.
    tasks: PendingTasks,
    pool: Arc<WorkerPool>,
}

impl Evaluator {
    /// Create an evaluator with fresh global state. Extern variables start at their default.
    pub fn new(env: Arc<Environment>, host: Arc<dyn Host>) -> Self {
        let mut globals = vec![None; env.global_count];
        for variable in env.variables.iter().filter(|v| v.owner == Owner::Global) {
            globals[variable.slot] = variable.default;
        }
        Self {
            env,
            host,
            globals: Arc::new(Mutex::new(globals)),
            frames: Vec::new(),
            tasks: PendingTasks::default(),
            pool: Arc::new(WorkerPool::new()),
        }
    }

    /// Execute the program's top level.
    ///
    /// A top-level `return` stops the program; its value is reported.
    pub fn run(&mut self) -> Result<RunReport, RuntimeDiagnostic> {
        tracing::debug!(nodes = self.env.root.nodes.len(), "running program");
        let env = Arc::clone(&self.env);
        let result = match self.exec_nodes(&env.root.nodes) {
            Ok(()) => ExecutionResult::none(),
            Err(RuntimeDiagnostic { error: RuntimeError::Return(result), .. }) => result,
            Err(diag) => return Err(diag),
        };
        let leaked_tasks = self.take_leaks();
        tracing::debug!(workers = self.pool.size(), leaked = leaked_tasks.len(), "program finished");
        Ok(RunReport { result, leaked_tasks })
    }

    /// Current value of a global variable.
    pub fn global_value(&self, var: VarId) -> Option<Value> {
        let variable = self.env.variable(var);
        match variable.owner {
            Owner::Global => self.lock_globals().get(variable.slot).copied().flatten(),
            Owner::Function(_) => None,
        }
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// An evaluator for an async task: same program, host, globals and pool, empty call stack.
    fn spawn_child(&self) -> Self {
        Self {
            env: Arc::clone(&self.env),
            host: Arc::clone(&self.host),
            globals: Arc::clone(&self.globals),
            frames: Vec::new(),
            tasks: PendingTasks::default(),
            pool: Arc::clone(&self.pool),
        }
    }

    fn take_leaks(&mut self) -> Vec<LeakedTask> {
        let env = Arc::clone(&self.env);
        let leaked = self.tasks.drain_leaks(|var| env.variable(var).name.clone());
        for task in &leaked {
            tracing::warn!(target = %task.target, function = %task.function, pos = %task.pos, "async call never awaited");
        }
        leaked
    }

    fn lock_globals(&self) -> MutexGuard<'_, Vec<Option<Value>>> {
        self.globals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Variable Slots
    // =========================================================================

    fn read_var(&self, var: VarId, pos: Pos) -> Result<Value, RuntimeDiagnostic> {
        let variable = self.env.variable(var);
        let value = match variable.owner {
            Owner::Global => self.lock_globals()[variable.slot],
            Owner::Function(fun) => self.frame_of(fun).and_then(|frame| frame.slots[variable.slot]),
        };
        value.ok_or_else(|| {
            RuntimeDiagnostic::new(RuntimeError::UninitializedVariable { name: variable.name.clone() }, pos)
        })
    }

    fn write_var(&mut self, var: VarId, value: Value, pos: Pos) -> Result<(), RuntimeDiagnostic> {
        let env = Arc::clone(&self.env);
        let variable = env.variable(var);
        if variable.ty != value.ty() {
            return Err(crate::error::mismatch(
                format!("assignment to `{}`", variable.name),
                variable.ty,
                value.ty(),
                pos,
            ));
        }
        match variable.owner {
            Owner::Global => self.lock_globals()[variable.slot] = Some(value),
            Owner::Function(fun) => match self.frames.iter_mut().rev().find(|frame| frame.fun == fun) {
                Some(frame) => frame.slots[variable.slot] = Some(value),
                None => {
                    return Err(RuntimeDiagnostic::new(
                        RuntimeError::UninitializedVariable { name: variable.name.clone() },
                        pos,
                    ))
                }
            },
        }
        Ok(())
    }

    /// Innermost active frame of `fun`.
    fn frame_of(&self, fun: FunId) -> Option<&Frame> {
        self.frames.iter().rev().find(|frame| frame.fun == fun)
    }

    /// The pending set an async call into `var` belongs to.
    fn tasks_for(&mut self, var: VarId) -> Option<&mut PendingTasks> {
        match self.env.variable(var).owner {
            Owner::Global => Some(&mut self.tasks),
            Owner::Function(fun) => {
                self.frames.iter_mut().rev().find(|frame| frame.fun == fun).map(|frame| &mut frame.tasks)
            }
        }
    }

    /// Pop the innermost frame. Its unawaited tasks become leaks.
    fn pop_frame(&mut self) {
        let Some(mut frame) = self.frames.pop() else { return };
        let env = Arc::clone(&self.env);
        let leaked = frame.tasks.drain_leaks(|var| env.variable(var).name.clone());
        self.tasks.extend_leaked(leaked);
    }
}
