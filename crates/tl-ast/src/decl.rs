// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Entries of the flat constant, variable and function tables.

use std::fmt;

use crate::{Block, NativeFn, ValType, Value, VarId};

/// A declared constant. Its value is fixed at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub ty: ValType,
    pub value: Value,
}

/// Where a variable's storage lives at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// One slot in the program-wide global vector.
    Global,
    /// One slot in every call frame of the owning function.
    Function(crate::FunId),
}

/// A declared variable (including function parameters).
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: ValType,
    pub owner: Owner,
    /// Index into the owner's slot vector.
    pub slot: usize,
    /// Initial value, set for extern variables.
    pub default: Option<Value>,
}

/// A function parameter: the variable it binds and its declared type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub var: VarId,
    pub ty: ValType,
}

/// A declared function, user-defined or extern.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: ValType,
    pub body: FunctionBody,
    /// Number of frame slots a call needs (parameters and locals).
    pub local_count: usize,
}

impl Function {
    pub fn is_native(&self) -> bool {
        matches!(self.body, FunctionBody::Precompiled(_))
    }

    pub fn block(&self) -> Option<&Block> {
        match &self.body {
            FunctionBody::Block(block) => Some(block),
            FunctionBody::Precompiled(_) => None,
        }
    }
}

/// A user block or a native callback.
#[derive(Clone)]
pub enum FunctionBody {
    Block(Block),
    Precompiled(NativeFn),
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::Block(block) => f.debug_tuple("Block").field(block).finish(),
            FunctionBody::Precompiled(_) => f.write_str("Precompiled(..)"),
        }
    }
}

impl PartialEq for FunctionBody {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FunctionBody::Block(a), FunctionBody::Block(b)) => a == b,
            (FunctionBody::Precompiled(a), FunctionBody::Precompiled(b)) => std::sync::Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
