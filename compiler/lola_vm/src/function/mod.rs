//! Functions and the call protocol.
//!
//! Every callable (environment native, object method, script function)
//! is a [`Function`]. Calling one yields a [`CallOrImmediate`]: either a
//! finished value, or a request for the VM to enter a script function.
//! The VM handles the request by pushing a frame and continuing its own
//! dispatch loop, so a native that forwards to a script callback never
//! re-enters the interpreter on the host stack.

use std::fmt;

use lola_ir::{CompiledUnit, FunctionId};

use crate::errors::{arity_mismatch, RuntimeError};
use crate::value::Value;

/// Result of calling a [`Function`].
#[derive(Clone, Debug, PartialEq)]
pub enum CallOrImmediate {
    /// The call already completed with this value.
    Immediate(Value),
    /// Transfer control to a script function; its return value becomes the
    /// result of the original call.
    Invoke {
        function: FunctionId,
        args: Vec<Value>,
    },
}

impl CallOrImmediate {
    /// Completed call with no meaningful result.
    pub fn void() -> Self {
        CallOrImmediate::Immediate(Value::Void)
    }
}

impl From<Value> for CallOrImmediate {
    fn from(value: Value) -> Self {
        CallOrImmediate::Immediate(value)
    }
}

type NativeBody = dyn Fn(&[Value]) -> Result<CallOrImmediate, RuntimeError>;

/// A host computation callable from scripts.
pub struct NativeFunction {
    /// Checked by the VM before the call; `None` accepts any count.
    arity: Option<usize>,
    body: Box<NativeBody>,
}

impl NativeFunction {
    /// Variadic native.
    pub fn new(
        body: impl Fn(&[Value]) -> Result<CallOrImmediate, RuntimeError> + 'static,
    ) -> Self {
        NativeFunction {
            arity: None,
            body: Box::new(body),
        }
    }

    /// Native that must be called with exactly `arity` arguments.
    pub fn with_arity(
        arity: usize,
        body: impl Fn(&[Value]) -> Result<CallOrImmediate, RuntimeError> + 'static,
    ) -> Self {
        NativeFunction {
            arity: Some(arity),
            body: Box::new(body),
        }
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn call(&self, args: &[Value]) -> Result<CallOrImmediate, RuntimeError> {
        (self.body)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Handle to a compiled script function.
///
/// Calling it never runs code directly; it produces an `Invoke` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptFunction {
    id: FunctionId,
    name: String,
    arity: usize,
}

impl ScriptFunction {
    /// Find a script function in `unit` by name.
    pub fn lookup(unit: &CompiledUnit, name: &str) -> Option<Self> {
        unit.function_by_name(name).map(|(id, entry)| ScriptFunction {
            id,
            name: entry.name.clone(),
            arity: usize::from(entry.arity),
        })
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn call(&self, args: &[Value]) -> Result<CallOrImmediate, RuntimeError> {
        if args.len() != self.arity {
            return Err(arity_mismatch(&self.name, self.arity, args.len()));
        }
        Ok(CallOrImmediate::Invoke {
            function: self.id,
            args: args.to_vec(),
        })
    }
}

/// Any callable.
#[derive(Debug)]
pub enum Function {
    Native(NativeFunction),
    Script(ScriptFunction),
}

impl Function {
    /// Declared argument count, if fixed.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Function::Native(native) => native.arity(),
            Function::Script(script) => Some(script.arity()),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<CallOrImmediate, RuntimeError> {
        match self {
            Function::Native(native) => native.call(args),
            Function::Script(script) => script.call(args),
        }
    }
}

impl From<NativeFunction> for Function {
    fn from(native: NativeFunction) -> Self {
        Function::Native(native)
    }
}

impl From<ScriptFunction> for Function {
    fn from(script: ScriptFunction) -> Self {
        Function::Script(script)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
