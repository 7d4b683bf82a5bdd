// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compile-time values tracked along one linear pass.

use std::collections::HashMap;

use tl_ast::{Environment, Value, VarId};

use crate::effects::Assigned;

/// Known values of variables at the current point of the pass.
#[derive(Debug, Default, Clone)]
pub(crate) struct Tracked {
    values: HashMap<VarId, Value>,
}

impl Tracked {
    pub fn get(&self, var: VarId) -> Option<Value> {
        self.values.get(&var).copied()
    }

    pub fn set(&mut self, var: VarId, value: Value) {
        self.values.insert(var, value);
    }

    pub fn forget(&mut self, var: VarId) {
        self.values.remove(&var);
    }

    pub fn forget_globals(&mut self, env: &Environment) {
        self.values.retain(|var, _| !env.is_global(*var));
    }

    pub fn forget_assigned(&mut self, assigned: &Assigned, env: &Environment) {
        if assigned.globals {
            self.forget_globals(env);
        }
        for var in &assigned.vars {
            self.forget(*var);
        }
    }

    /// Known global values, for a compile-time call to work on.
    pub fn globals(&self, env: &Environment) -> HashMap<VarId, Value> {
        self.values.iter().filter(|(var, _)| env.is_global(**var)).map(|(var, value)| (*var, *value)).collect()
    }

    /// Adopt the globals left by a successful compile-time call.
    pub fn commit_globals(&mut self, globals: HashMap<VarId, Value>) {
        self.values.extend(globals);
    }
}
