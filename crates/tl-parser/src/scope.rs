// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbol table and scope stack for name resolution.
//!
//! Every block gets a fresh `scope_index` that is never reused, and a
//! `scope_level` equal to its nesting depth. A name is visible when it was
//! declared in the current scope or in one of the enclosing scopes still open
//! on the stack; among visible candidates the deepest declaration wins.

use tl_ast::ValType;

/// Which flat table an identifier indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Const,
    Var,
    Fun,
}

/// A declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub category: Category,
    pub name: String,
    pub scope_level: u32,
    pub scope_index: u32,
    /// Index into the table of `category`.
    pub ref_id: u32,
    pub declared_type: ValType,
}

/// Returned by [`SymbolTable::declare`] when `(name, scope_index)` is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate;

/// Flat list of identifiers plus the open-scope stack.
#[derive(Debug)]
pub struct SymbolTable {
    identifiers: Vec<Identifier>,
    /// Enclosing scope indices, innermost last.
    open: Vec<u32>,
    current: u32,
    level: u32,
    next_scope: u32,
    counters: [u32; 3],
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table positioned in scope 0, the module scope.
    pub fn new() -> Self {
        Self { identifiers: Vec::new(), open: Vec::new(), current: 0, level: 0, next_scope: 1, counters: [0; 3] }
    }

    pub fn current_scope(&self) -> u32 {
        self.current
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Declare `name` in the current scope, assigning the next ref id of its category.
    pub fn declare(&mut self, category: Category, name: &str, declared_type: ValType) -> Result<&Identifier, Duplicate> {
        if self.identifiers.iter().any(|id| id.name == name && id.scope_index == self.current) {
            return Err(Duplicate);
        }
        let counter = &mut self.counters[category as usize];
        let ref_id = *counter;
        *counter += 1;
        self.identifiers.push(Identifier {
            category,
            name: name.to_string(),
            scope_level: self.level,
            scope_index: self.current,
            ref_id,
            declared_type,
        });
        Ok(&self.identifiers[self.identifiers.len() - 1])
    }

    /// Find the innermost visible declaration of `name`.
    pub fn resolve(&self, name: &str) -> Option<&Identifier> {
        self.identifiers
            .iter()
            .filter(|id| id.name == name && (id.scope_index == self.current || self.open.contains(&id.scope_index)))
            .max_by_key(|id| id.scope_level)
    }

    /// Allocate a scope index without entering it.
    pub fn reserve_scope(&mut self) -> u32 {
        let index = self.next_scope;
        self.next_scope += 1;
        index
    }

    /// Enter a new block scope and return its index.
    pub fn enter_block(&mut self) -> u32 {
        let index = self.reserve_scope();
        self.enter(index);
        index
    }

    /// Enter a scope reserved earlier with [`reserve_scope`](Self::reserve_scope).
    pub fn enter(&mut self, index: u32) {
        self.open.push(self.current);
        self.current = index;
        self.level += 1;
    }

    /// Leave the current scope, restoring the enclosing one.
    pub fn exit(&mut self) {
        if let Some(enclosing) = self.open.pop() {
            self.current = enclosing;
            self.level -= 1;
        }
    }
}
