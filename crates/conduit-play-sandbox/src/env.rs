//! Scoped variable environment for the sandbox interpreter.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::heap::{self, Clear};
use crate::value::Value;

/// A single scope level.
struct Scope {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

impl Clear for Scope {
    fn clear(&self) {
        if let Ok(mut bindings) = self.bindings.try_borrow_mut() {
            bindings.clear();
        }
    }
}

/// Shared, chained variable environment.
///
/// Each function call gets a child of the environment its closure captured;
/// blocks do not open scopes (`var` is function-scoped). Variables are looked
/// up from the innermost scope outward. `define` always creates in the
/// current scope; `set` updates the first scope where the variable exists.
#[derive(Clone)]
pub struct Environment(Rc<Scope>);

impl Environment {
    /// Create a new environment with one global scope.
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    /// A fresh function scope whose parent is `self`.
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    fn with_parent(parent: Option<Environment>) -> Self {
        let scope = Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent,
        });
        heap::track(&scope);
        Self(scope)
    }

    /// Define a variable in this scope.
    pub fn define(&self, name: &str, value: Value) {
        self.0.bindings.borrow_mut().insert(name.to_string(), value);
    }

    /// Look up a variable, searching from innermost to outermost scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(v) = env.0.bindings.borrow().get(name) {
                return Some(v.clone());
            }
            scope = env.0.parent.as_ref();
        }
        None
    }

    /// Update a variable in the first scope where it exists.
    /// Returns `true` if found and updated, `false` if not found.
    pub fn set(&self, name: &str, value: Value) -> bool {
        let mut scope = Some(self);
        while let Some(env) = scope {
            let mut bindings = env.0.bindings.borrow_mut();
            if let Some(slot) = bindings.get_mut(name) {
                *slot = value;
                return true;
            }
            drop(bindings);
            scope = env.0.parent.as_ref();
        }
        false
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.bindings.borrow().keys().cloned().collect();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
