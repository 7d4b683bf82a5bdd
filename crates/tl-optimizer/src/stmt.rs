// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The folding pass and its statement handlers.
//!
//! A bail-out unwinds to the statement that started the fold. That statement
//! keeps its unfolded parts as parsed and marks its targets unknown.

use std::mem;

use tl_ast::{Block, Environment, Expr, FunId, FunctionBody, Node, NodeKind, Pos, ValType, Value, VarId};

use crate::effects::{assigned_in, expr_has_call};
use crate::error::{Bail, OptimizeError};
use crate::fold::Folded;
use crate::state::Tracked;
use crate::OptimizeStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Keep,
    Remove,
}

pub(crate) struct Pass<'a> {
    pub env: &'a mut Environment,
    pub tracked: Tracked,
    pub branch_quota: usize,
    /// Every variable read bails, and bails propagate to the enclosing loop.
    pub constant_only: bool,
    /// Functions whose bodies are being folded, innermost last.
    pub folding: Vec<FunId>,
    pub stats: OptimizeStats,
}

impl<'a> Pass<'a> {
    pub fn new(env: &'a mut Environment, branch_quota: usize) -> Self {
        Self {
            env,
            tracked: Tracked::default(),
            branch_quota,
            constant_only: false,
            folding: Vec::new(),
            stats: OptimizeStats::default(),
        }
    }

    pub fn run(mut self) -> Result<OptimizeStats, OptimizeError> {
        let mut nodes = mem::take(&mut self.env.root.nodes);
        let result = self.fold_nodes(&mut nodes);
        self.env.root.nodes = nodes;
        debug_assert!(!matches!(result, Err(Bail::NotConstant)), "constant-only bail escaped the top level");
        match result {
            Ok(()) => Ok(self.stats),
            Err(Bail::NotConstant) => {
                tracing::warn!("constant-only bail reached the top level; later statements left unfolded");
                Ok(self.stats)
            }
            Err(Bail::Fatal(err)) => Err(err),
        }
    }

    fn fold_nodes(&mut self, nodes: &mut Vec<Node>) -> Result<(), Bail> {
        let mut actions = Vec::with_capacity(nodes.len());
        for node in nodes.iter_mut() {
            actions.push(self.fold_node(node)?);
        }
        let mut actions = actions.into_iter();
        nodes.retain(|_| actions.next() != Some(Action::Remove));
        Ok(())
    }

    fn fold_node(&mut self, node: &mut Node) -> Result<Action, Bail> {
        let pos = node.pos;
        match &mut node.kind {
            NodeKind::ConstDecl(_) => {}
            NodeKind::VarDecl { var, init: Some(expr) } | NodeKind::Assign { var, expr } => {
                self.fold_target(*var, expr)?;
            }
            NodeKind::VarDecl { var, init: None } => self.tracked.forget(*var),
            NodeKind::FunDecl(fun) => {
                let fun = *fun;
                self.fold_function(fun)?;
                if self.env.function(fun).block().is_some_and(Block::is_empty) {
                    self.stats.removed_blocks += 1;
                    return Ok(Action::Remove);
                }
            }
            NodeKind::Block(block) => {
                self.fold_nodes(&mut block.nodes)?;
                if block.is_empty() {
                    self.stats.removed_blocks += 1;
                    return Ok(Action::Remove);
                }
            }
            NodeKind::If { cond, body } => self.fold_if(cond, body)?,
            NodeKind::While { cond, body } => self.fold_loop(cond, body, pos)?,
            NodeKind::Return(expr) => self.fold_return(expr)?,
            NodeKind::CallStmt(call) => match self.fold_call(call, pos) {
                Ok(folded) if folded.elidable => {
                    self.stats.elided_calls += 1;
                    return Ok(Action::Remove);
                }
                Ok(_) => {}
                Err(Bail::NotConstant) if !self.constant_only => {}
                Err(bail) => return Err(bail),
            },
            NodeKind::Async { target, call } => {
                if self.constant_only {
                    return Err(Bail::NotConstant);
                }
                for arg in &mut call.args {
                    self.fold_slot(arg)?;
                }
                self.tracked.forget(*target);
                if !self.env.function(call.fun).is_native() {
                    self.tracked.forget_globals(self.env);
                }
            }
            NodeKind::Await(target) => {
                if self.constant_only {
                    return Err(Bail::NotConstant);
                }
                // The task's writes are visible from here on.
                self.tracked.forget(*target);
                self.tracked.forget_globals(self.env);
            }
        }
        Ok(Action::Keep)
    }

    fn fold_target(&mut self, var: VarId, expr: &mut Expr) -> Result<(), Bail> {
        match self.fold_slot(expr)? {
            Some(folded) => {
                let variable = self.env.variable(var);
                if variable.ty != folded.value.ty() {
                    let context = format!("assignment to `{}`", variable.name);
                    return Err(OptimizeError::mismatch(context, variable.ty, folded.value.ty(), expr.pos).into());
                }
                self.tracked.set(var, folded.value);
            }
            None => self.tracked.forget(var),
        }
        Ok(())
    }

    fn fold_return(&mut self, expr: &mut Expr) -> Result<(), Bail> {
        let Some(folded) = self.fold_slot(expr)? else {
            return Ok(());
        };
        if let Some(&fun) = self.folding.last() {
            let function = self.env.function(fun);
            if function.ret != folded.value.ty() {
                let context = format!("return value of `{}`", function.name);
                return Err(OptimizeError::mismatch(context, function.ret, folded.value.ty(), expr.pos).into());
            }
        }
        Ok(())
    }

    fn fold_if(&mut self, cond: &mut Expr, body: &mut Block) -> Result<(), Bail> {
        match self.fold_slot(cond)? {
            Some(Folded { value: Value::Bool(true), .. }) => self.fold_nodes(&mut body.nodes)?,
            Some(Folded { value: Value::Bool(false), .. }) => {}
            Some(folded) => {
                return Err(OptimizeError::mismatch("`if` condition", ValType::Bool, folded.value.ty(), cond.pos).into())
            }
            None => {
                self.fold_nodes(&mut body.nodes)?;
                let assigned = assigned_in(&body.nodes);
                self.tracked.forget_assigned(&assigned, self.env);
            }
        }
        Ok(())
    }

    /// Loops are folded on a copy in constant-only mode and committed only
    /// when nothing bailed. No unrolling.
    fn fold_loop(&mut self, cond: &mut Expr, body: &mut Block, pos: Pos) -> Result<(), Bail> {
        let saved_tracked = self.tracked.clone();
        let saved_stats = self.stats;
        let outer_constant_only = mem::replace(&mut self.constant_only, true);

        let mut new_cond = cond.clone();
        let mut new_body = body.clone();
        let result = self.fold_loop_copy(&mut new_cond, &mut new_body);

        self.constant_only = outer_constant_only;
        self.tracked = saved_tracked;
        match result {
            Ok(true) => {
                *cond = new_cond;
                *body = new_body;
            }
            Ok(false) => self.stats = saved_stats,
            Err(Bail::NotConstant) if !outer_constant_only => {
                tracing::debug!(%pos, "loop depends on a variable; left as parsed");
                self.stats = saved_stats;
            }
            Err(bail) => return Err(bail),
        }

        let assigned = assigned_in(&body.nodes);
        self.tracked.forget_assigned(&assigned, self.env);
        if expr_has_call(cond) {
            self.tracked.forget_globals(self.env);
        }
        Ok(())
    }

    /// Returns whether the folded copy should replace the loop.
    fn fold_loop_copy(&mut self, cond: &mut Expr, body: &mut Block) -> Result<bool, Bail> {
        let folded = self.fold_slot(cond)?.ok_or(Bail::NotConstant)?;
        match folded.value {
            Value::Bool(false) => Ok(false),
            Value::Bool(true) => {
                self.fold_nodes(&mut body.nodes)?;
                Ok(true)
            }
            other => Err(OptimizeError::mismatch("`while` condition", ValType::Bool, other.ty(), cond.pos).into()),
        }
    }

    /// Fold a function body once, with parameters and globals unknown.
    fn fold_function(&mut self, fun: FunId) -> Result<(), Bail> {
        let mut nodes = match &mut self.env.function_mut(fun).body {
            FunctionBody::Block(block) => mem::take(&mut block.nodes),
            FunctionBody::Precompiled(_) => return Ok(()),
        };
        let saved_tracked = mem::take(&mut self.tracked);
        let outer_constant_only = mem::replace(&mut self.constant_only, false);
        self.folding.push(fun);

        let result = self.fold_nodes(&mut nodes);

        self.folding.pop();
        self.constant_only = outer_constant_only;
        self.tracked = saved_tracked;
        if let FunctionBody::Block(block) = &mut self.env.function_mut(fun).body {
            block.nodes = nodes;
        }
        debug_assert!(!matches!(result, Err(Bail::NotConstant)), "constant-only bail escaped a function body");
        match result {
            Ok(()) => Ok(()),
            Err(Bail::NotConstant) => {
                let name = &self.env.function(fun).name;
                tracing::warn!(function = %name, "constant-only bail escaped a function body; rest left unfolded");
                Ok(())
            }
            Err(Bail::Fatal(err)) => Err(Bail::Fatal(err)),
        }
    }
}
