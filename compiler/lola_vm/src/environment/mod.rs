//! Host environment.
//!
//! The environment is everything a script can reach that the compiled
//! unit does not own: native functions and host globals. A host global is
//! either a plain slot or a computed pair of getter and optional setter;
//! a computed global without a setter is read-only.
//!
//! The VM borrows the environment for its whole run and writes plain
//! slots through interior mutability. It is not synchronized and must only
//! be used from the thread driving the VM.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::errors::{read_only_global, undefined_symbol, RuntimeError, RuntimeErrorKind};
use crate::function::Function;
use crate::value::Value;

/// Registration conflict.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("native function `{0}` is already registered")]
    DuplicateNative(String),
    #[error("global `{0}` is already registered")]
    DuplicateGlobal(String),
}

type Getter = Box<dyn Fn() -> Value>;
type Setter = Box<dyn Fn(Value)>;

enum GlobalSlot {
    Plain(RefCell<Value>),
    Computed {
        getter: Getter,
        setter: Option<Setter>,
    },
}

/// Host-provided names visible to scripts: native functions and globals.
///
/// Registration happens before execution; VMs borrow the environment
/// shared, so globals use interior mutability.
#[derive(Default)]
pub struct Environment {
    natives: FxHashMap<String, Function>,
    globals: FxHashMap<String, GlobalSlot>,
}

impl Environment {
    /// An environment with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    // Registration

    /// Make `function` callable from scripts as `name(...)`.
    ///
    /// Fails if a native with the same name is already registered.
    pub fn register_native(
        &mut self,
        name: impl Into<String>,
        function: impl Into<Function>,
    ) -> Result<(), EnvironmentError> {
        let name = name.into();
        if self.natives.contains_key(&name) {
            return Err(EnvironmentError::DuplicateNative(name));
        }
        self.natives.insert(name, function.into());
        Ok(())
    }

    /// Register a plain mutable global.
    pub fn register_global(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<(), EnvironmentError> {
        self.insert_global(name.into(), GlobalSlot::Plain(RefCell::new(value)))
    }

    /// Register a global backed by a getter and, unless read-only, a setter.
    ///
    /// The getter runs on every read; nothing is cached.
    pub fn register_computed_global(
        &mut self,
        name: impl Into<String>,
        getter: impl Fn() -> Value + 'static,
        setter: Option<Box<dyn Fn(Value)>>,
    ) -> Result<(), EnvironmentError> {
        self.insert_global(
            name.into(),
            GlobalSlot::Computed {
                getter: Box::new(getter),
                setter,
            },
        )
    }

    fn insert_global(&mut self, name: String, slot: GlobalSlot) -> Result<(), EnvironmentError> {
        if self.globals.contains_key(&name) {
            return Err(EnvironmentError::DuplicateGlobal(name));
        }
        self.globals.insert(name, slot);
        Ok(())
    }

    // Lookup

    /// The native registered under `name`.
    pub fn native(&self, name: &str) -> Option<&Function> {
        self.natives.get(name)
    }

    /// Current value of a host global, if one is registered.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).map(|slot| match slot {
            GlobalSlot::Plain(cell) => cell.borrow().clone(),
            GlobalSlot::Computed { getter, .. } => getter(),
        })
    }

    /// Read a host global on behalf of a script.
    pub fn read_global(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.global(name) {
            return Ok(value);
        }
        Err(self.missing_global(name))
    }

    /// Write a host global on behalf of a script.
    pub fn write_global(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self.globals.get(name) {
            Some(GlobalSlot::Plain(cell)) => {
                *cell.borrow_mut() = value;
                Ok(())
            }
            Some(GlobalSlot::Computed {
                setter: Some(setter),
                ..
            }) => {
                setter(value);
                Ok(())
            }
            Some(GlobalSlot::Computed { setter: None, .. }) => Err(read_only_global(name)),
            None => Err(self.missing_global(name)),
        }
    }

    /// Natives are not values: naming one as a variable is a type error.
    #[cold]
    fn missing_global(&self, name: &str) -> RuntimeError {
        if self.natives.contains_key(name) {
            RuntimeErrorKind::TypeMismatch {
                expected: "value".to_string(),
                got: format!("native function `{name}`"),
            }
            .into()
        } else {
            undefined_symbol(name)
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut natives: Vec<&str> = self.natives.keys().map(String::as_str).collect();
        let mut globals: Vec<&str> = self.globals.keys().map(String::as_str).collect();
        natives.sort_unstable();
        globals.sort_unstable();
        f.debug_struct("Environment")
            .field("natives", &natives)
            .field("globals", &globals)
            .finish()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
