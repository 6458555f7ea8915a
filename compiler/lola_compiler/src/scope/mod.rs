//! Lexical scopes and local slot allocation.
//!
//! Each function (and the top-level code) gets one [`ScopeStack`]. Blocks
//! push a scope; popping it releases the slots it allocated so sibling
//! blocks reuse them. A shadowing declaration in an inner scope always gets
//! a fresh slot, leaving the outer binding intact.
//!
//! A scope also remembers names it will declare but has not declared yet
//! ([`ScopeStack::announce`]); a reference to one of those while its scope
//! is open is a use before declaration.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{limit_exceeded, CompileErrorKind};

struct Scope {
    names: FxHashMap<String, u16>,
    /// Announced names whose declaration has not been lowered yet.
    pending: FxHashSet<String>,
    /// First slot owned by this scope.
    base: u16,
}

/// Outcome of declaring a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Declared {
    Slot(u16),
    /// The name already exists in the innermost scope.
    Duplicate,
}

pub struct ScopeStack {
    scopes: Vec<Scope>,
    next_slot: u16,
    max_slots: u16,
}

impl ScopeStack {
    /// A stack holding a single (function-level) scope.
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope {
                names: FxHashMap::default(),
                pending: FxHashSet::default(),
                base: 0,
            }],
            next_slot: 0,
            max_slots: 0,
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope {
            names: FxHashMap::default(),
            pending: FxHashSet::default(),
            base: self.next_slot,
        });
    }

    /// Leave the innermost scope, releasing its slots.
    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popped the function scope");
        if self.scopes.len() > 1 {
            if let Some(scope) = self.scopes.pop() {
                self.next_slot = scope.base;
            }
        }
    }

    /// Whether only the function-level scope is open.
    pub fn is_outermost(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Bind `name` to a fresh slot in the innermost scope.
    pub fn declare(&mut self, name: &str) -> Result<Declared, CompileErrorKind> {
        if self
            .scopes
            .last()
            .is_some_and(|scope| scope.names.contains_key(name))
        {
            return Ok(Declared::Duplicate);
        }
        let slot = self.alloc_hidden()?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.pending.remove(name);
            scope.names.insert(name.to_string(), slot);
        }
        Ok(Declared::Slot(slot))
    }

    /// Record that the innermost scope declares `name` further on.
    pub fn announce(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            if !scope.names.contains_key(name) {
                scope.pending.insert(name.to_string());
            }
        }
    }

    /// Whether an open scope has announced `name` without declaring it yet.
    pub fn is_pending(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.pending.contains(name))
    }

    /// Allocate an unnamed slot in the innermost scope.
    pub fn alloc_hidden(&mut self) -> Result<u16, CompileErrorKind> {
        let slot = self.next_slot;
        self.next_slot = slot
            .checked_add(1)
            .ok_or_else(|| limit_exceeded("local slots", usize::from(u16::MAX)))?;
        self.max_slots = self.max_slots.max(self.next_slot);
        Ok(slot)
    }

    /// Resolve `name`, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name).copied())
    }

    /// Peak number of slots live at once; the frame size.
    pub fn max_slots(&self) -> u16 {
        self.max_slots
    }
}
