//! Symbol table and compile-time scope resolution
//!
//! The table is a stack of scopes, innermost last; the scope below another
//! is its lexical parent. The compiler pushes a scope when it starts a
//! function body and pops it when the body is done, so the stack always
//! mirrors the nesting of the function literal being compiled.
//!
//! Resolving a name that lives in an enclosing *function* scope promotes it
//! to a free variable of every scope between the definition and the use.
//! Globals and builtins are addressable from anywhere and are never captured.

use crate::stdlib::BUILTINS;
use std::collections::HashMap;

/// Storage class of a resolved name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    /// Slot in the globals store
    Global,
    /// Slot above the current frame's base pointer
    Local,
    /// Index into the builtin registry
    Builtin,
    /// Index into the running closure's captured values
    Free,
    /// The function currently being defined, by its own name
    FunctionSelf,
}

/// A resolved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

impl Symbol {
    fn new(name: &str, scope: SymbolScope, index: usize) -> Self {
        Self {
            name: name.to_string(),
            scope,
            index,
        }
    }
}

/// What a function scope leaves behind when it is popped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSummary {
    /// Captured symbols as seen from the enclosing scope, in capture order
    pub free_symbols: Vec<Symbol>,
    /// Parameters plus local `let` bindings
    pub num_definitions: usize,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    store: HashMap<String, Symbol>,
    num_definitions: usize,
    free_symbols: Vec<Symbol>,
}

/// Scope-chain resolver used by the compiler
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Stack of scopes (global first, innermost last)
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table with only an empty global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Create a global table with every builtin registered at its index
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for builtin in BUILTINS {
            table.define_builtin(builtin.index as usize, builtin.name);
        }
        table
    }

    /// Nesting depth: 0 at top level
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Open a scope for a function body
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Close the innermost function scope
    ///
    /// The global scope is never popped; calling this at top level returns
    /// `None` and leaves the table untouched.
    pub fn leave_scope(&mut self) -> Option<ScopeSummary> {
        if self.scopes.len() == 1 {
            return None;
        }
        self.scopes.pop().map(|scope| ScopeSummary {
            free_symbols: scope.free_symbols,
            num_definitions: scope.num_definitions,
        })
    }

    /// Define a name in the innermost scope at the next free index
    ///
    /// Redefining a name shadows it with a fresh slot.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope_kind = if self.depth() == 0 {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let scope = self.current();
        let symbol = Symbol::new(name, scope_kind, scope.num_definitions);
        scope.store.insert(name.to_string(), symbol.clone());
        scope.num_definitions += 1;
        symbol
    }

    /// Register a builtin at a fixed registry index
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol::new(name, SymbolScope::Builtin, index);
        self.current()
            .store
            .insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Register the function being compiled under its own name
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol::new(name, SymbolScope::FunctionSelf, 0);
        self.current()
            .store
            .insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Resolve a name from the innermost scope outward
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        let depth = self.depth();
        self.resolve_at(depth, name)
    }

    fn resolve_at(&mut self, depth: usize, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.scopes[depth].store.get(name) {
            return Some(symbol.clone());
        }
        if depth == 0 {
            return None;
        }

        let outer = self.resolve_at(depth - 1, name)?;
        match outer.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(outer),
            SymbolScope::Local | SymbolScope::Free | SymbolScope::FunctionSelf => {
                Some(self.define_free(depth, outer))
            }
        }
    }

    /// Capture `original` (as resolved in the parent) into scope `depth`
    fn define_free(&mut self, depth: usize, original: Symbol) -> Symbol {
        let scope = &mut self.scopes[depth];
        let symbol = Symbol::new(&original.name, SymbolScope::Free, scope.free_symbols.len());
        scope.free_symbols.push(original);
        scope.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Captured symbols of the innermost scope, in capture order
    pub fn free_symbols(&self) -> &[Symbol] {
        &self.scopes[self.scopes.len() - 1].free_symbols
    }

    /// Number of `define`d names in the innermost scope
    pub fn num_definitions(&self) -> usize {
        self.scopes[self.scopes.len() - 1].num_definitions
    }
}
