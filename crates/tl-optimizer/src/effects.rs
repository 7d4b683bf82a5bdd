// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Side-effect classification and assignment summaries.

use std::collections::HashSet;

use tl_ast::{Environment, Expr, ExprKind, FunId, Node, NodeKind, Owner, VarId};

/// Whether calling `fun` can be observed beyond its return value.
///
/// Conservative: any nested call, any `async`/`await`, or any assignment to
/// a variable the function does not own makes it impure. Natives are impure.
pub fn has_side_effects(env: &Environment, fun: FunId) -> bool {
    match env.function(fun).block() {
        Some(body) => body.nodes.iter().any(|node| node_has_effects(env, fun, node)),
        None => true,
    }
}

fn node_has_effects(env: &Environment, fun: FunId, node: &Node) -> bool {
    match &node.kind {
        // Nested declarations do nothing until called.
        NodeKind::ConstDecl(_) | NodeKind::FunDecl(_) => false,
        NodeKind::VarDecl { init, .. } => init.as_ref().is_some_and(expr_has_call),
        NodeKind::Assign { var, expr } => env.variable(*var).owner != Owner::Function(fun) || expr_has_call(expr),
        NodeKind::Block(block) => block.nodes.iter().any(|n| node_has_effects(env, fun, n)),
        NodeKind::If { cond, body } | NodeKind::While { cond, body } => {
            expr_has_call(cond) || body.nodes.iter().any(|n| node_has_effects(env, fun, n))
        }
        NodeKind::Return(expr) => expr_has_call(expr),
        NodeKind::CallStmt(_) | NodeKind::Async { .. } | NodeKind::Await(_) => true,
    }
}

pub(crate) fn expr_has_call(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::ConstVal(_) | ExprKind::ConstRef(_) | ExprKind::VarRef(_) => false,
        ExprKind::UnOp { operand, .. } => expr_has_call(operand),
        ExprKind::BinOp { left, right, .. } => expr_has_call(left) || expr_has_call(right),
        ExprKind::Call(_) => true,
    }
}

/// Variables a statement list may write.
#[derive(Debug, Default)]
pub(crate) struct Assigned {
    pub vars: HashSet<VarId>,
    /// A call or task may write any global.
    pub globals: bool,
}

pub(crate) fn assigned_in(nodes: &[Node]) -> Assigned {
    let mut assigned = Assigned::default();
    collect(nodes, &mut assigned);
    assigned
}

fn collect(nodes: &[Node], out: &mut Assigned) {
    for node in nodes {
        match &node.kind {
            NodeKind::ConstDecl(_) | NodeKind::FunDecl(_) => {}
            NodeKind::VarDecl { var, init } => {
                out.vars.insert(*var);
                out.globals |= init.as_ref().is_some_and(expr_has_call);
            }
            NodeKind::Assign { var, expr } => {
                out.vars.insert(*var);
                out.globals |= expr_has_call(expr);
            }
            NodeKind::Block(block) => collect(&block.nodes, out),
            NodeKind::If { cond, body } | NodeKind::While { cond, body } => {
                out.globals |= expr_has_call(cond);
                collect(&body.nodes, out);
            }
            NodeKind::Return(expr) => out.globals |= expr_has_call(expr),
            NodeKind::CallStmt(_) => out.globals = true,
            NodeKind::Async { target, .. } => {
                out.vars.insert(*target);
                out.globals = true;
            }
            NodeKind::Await(target) => {
                out.vars.insert(*target);
            }
        }
    }
}
