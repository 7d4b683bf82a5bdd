// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parsed program: root node plus the flat tables.

use crate::{ConstId, Constant, FunId, Function, Owner, Prog, VarId, Variable};

/// A scope-0 identifier, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalIdentifier {
    Const(ConstId),
    Var(VarId),
    Fun(FunId),
}

/// Everything the evaluator and optimizer need to work on a program.
///
/// The tables hold declarations only. Run-time values live in the
/// evaluator, compile-time values in the optimizer, so every run over the
/// same environment starts from clean state.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub root: Prog,
    pub constants: Vec<Constant>,
    pub variables: Vec<Variable>,
    pub functions: Vec<Function>,
    /// Number of global variable slots.
    pub global_count: usize,
    /// Identifiers declared at scope 0, injected ones first.
    pub globals: Vec<GlobalIdentifier>,
}

impl Environment {
    pub fn constant(&self, id: ConstId) -> &Constant {
        &self.constants[id.index()]
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn function(&self, id: FunId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FunId) -> &mut Function {
        &mut self.functions[id.index()]
    }

    pub fn is_global(&self, id: VarId) -> bool {
        self.variable(id).owner == Owner::Global
    }

    /// Find a scope-0 function by name.
    pub fn global_function(&self, name: &str) -> Option<FunId> {
        self.globals.iter().find_map(|g| match *g {
            GlobalIdentifier::Fun(id) if self.function(id).name == name => Some(id),
            _ => None,
        })
    }

    /// Find a scope-0 variable by name.
    pub fn global_variable(&self, name: &str) -> Option<VarId> {
        self.globals.iter().find_map(|g| match *g {
            GlobalIdentifier::Var(id) if self.variable(id).name == name => Some(id),
            _ => None,
        })
    }

    /// Find a scope-0 constant by name.
    pub fn global_constant(&self, name: &str) -> Option<ConstId> {
        self.globals.iter().find_map(|g| match *g {
            GlobalIdentifier::Const(id) if self.constant(id).name == name => Some(id),
            _ => None,
        })
    }
}
