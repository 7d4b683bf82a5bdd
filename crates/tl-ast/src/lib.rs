// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Shared data model for the tl scripting core.
//!
//! This crate defines the tokens consumed by the parser, the typed AST it
//! produces, the flat constant/variable/function tables that travel with the
//! tree, and the operator semantics shared by the evaluator and the optimizer.

pub mod span;
pub mod token;
pub mod types;
pub mod ops;
pub mod node;
pub mod decl;
pub mod native;
pub mod env;

pub use decl::{Constant, Function, FunctionBody, Owner, Param, Variable};
pub use env::{Environment, GlobalIdentifier};
pub use native::{AssertionReport, ExternIdentifier, Host, NativeCall, NativeError, NativeFn};
pub use node::{Block, Call, Expr, ExprKind, Node, NodeKind, Prog};
pub use ops::{BinOp, OpError, UnOp};
pub use span::{LineMap, Pos};
pub use types::{ExecutionResult, ValType, Value};

/// Index into the flat constant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstId(pub u32);

/// Index into the flat variable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub u32);

/// Index into the flat function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunId(pub u32);

macro_rules! impl_index {
    ($($id:ident),*) => {
        $(
            impl $id {
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl std::fmt::Display for $id {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "#{}", self.0)
                }
            }
        )*
    };
}

impl_index!(ConstId, VarId, FunId);
