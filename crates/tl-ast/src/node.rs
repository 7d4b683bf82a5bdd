// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement and expression nodes.
//!
//! The tree owns its children exclusively. Identifier uses are resolved to
//! table ids by the parser, so nodes never point back into the symbol table.

use crate::{BinOp, ConstId, FunId, Pos, UnOp, Value, VarId};

/// The root of a parsed program: the top-level nodes in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prog {
    pub nodes: Vec<Node>,
}

/// A `{ ... }` block with its own scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub scope_index: u32,
    pub nodes: Vec<Node>,
    pub pos: Pos,
}

/// A declaration or statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `const name: type = value`; the value lives in the constant table.
    ConstDecl(ConstId),
    /// `var name: type [= init]`
    VarDecl { var: VarId, init: Option<Expr> },
    /// `fun name(...) { ... }`; params and body live in the function table.
    FunDecl(FunId),
    Block(Block),
    If { cond: Expr, body: Block },
    While { cond: Expr, body: Block },
    Return(Expr),
    /// `name := expr`
    Assign { var: VarId, expr: Expr },
    CallStmt(Call),
    /// Start `call` concurrently; its result is stored into `target` at the matching await.
    Async { target: VarId, call: Call },
    Await(VarId),
}

/// A resolved function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub fun: FunId,
    pub args: Vec<Expr>,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    UnOp { op: UnOp, operand: Box<Expr> },
    BinOp { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    /// An anonymous literal.
    ConstVal(Value),
    ConstRef(ConstId),
    VarRef(VarId),
    Call(Call),
}

impl Node {
    pub fn new(kind: NodeKind, pos: Pos) -> Self {
        Self { kind, pos }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn literal(value: Value, pos: Pos) -> Self {
        Self { kind: ExprKind::ConstVal(value), pos }
    }

    pub fn as_literal(&self) -> Option<Value> {
        match self.kind {
            ExprKind::ConstVal(v) => Some(v),
            _ => None,
        }
    }
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
