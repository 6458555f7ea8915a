//! Runtime errors.
//!
//! [`RuntimeErrorKind`] is the typed category; [`RuntimeError`] adds the
//! instruction offset and call-stack backtrace captured when the VM
//! faulted. Natives and operators build errors through the `#[cold]`
//! factory functions below; the VM fills in the location.

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// Typed runtime error category.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RuntimeErrorKind {
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: f64, len: usize },
    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String },
    #[error("global `{name}` is read-only")]
    ReadOnlyGlobal { name: String },
    #[error("object has no method `{method}`")]
    NoSuchMethod { method: String },
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("{what} overflow (limit {limit})")]
    StackOverflow { what: &'static str, limit: usize },
    #[error("invalid bytecode: {detail}")]
    InvalidBytecode { detail: String },
    #[error("{message}")]
    Host { message: String },
}

// Backtrace

/// One frame of a runtime backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub function: String,
    /// Offset of the instruction the frame was executing.
    pub pc: usize,
}

/// Call stack at the point of failure, innermost frame first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Backtrace {
    frames: Vec<BacktraceFrame>,
}

impl Backtrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {} at {:04}", frame.function, frame.pc)?;
        }
        Ok(())
    }
}

// Runtime error

/// A runtime error with the location it surfaced at.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Offset of the faulting instruction; `None` until the VM reports it.
    pub pc: Option<usize>,
    pub backtrace: Backtrace,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        RuntimeError {
            kind,
            pc: None,
            backtrace: Backtrace::default(),
        }
    }

    /// Attach the faulting location, keeping any location already set.
    #[must_use]
    pub fn with_location(mut self, pc: usize, backtrace: Backtrace) -> Self {
        if self.pc.is_none() {
            self.pc = Some(pc);
            self.backtrace = backtrace;
        }
        self
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runtime error: {}", self.kind)?;
        if let Some(pc) = self.pc {
            write!(f, " at {pc:04}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

// Factories

#[cold]
pub fn type_mismatch(expected: &str, got: &Value) -> RuntimeError {
    RuntimeErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
    .into()
}

#[cold]
pub fn division_by_zero() -> RuntimeError {
    RuntimeErrorKind::DivisionByZero.into()
}

#[cold]
pub fn index_out_of_range(index: f64, len: usize) -> RuntimeError {
    RuntimeErrorKind::IndexOutOfRange { index, len }.into()
}

#[cold]
pub fn undefined_symbol(name: &str) -> RuntimeError {
    RuntimeErrorKind::UndefinedSymbol {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn read_only_global(name: &str) -> RuntimeError {
    RuntimeErrorKind::ReadOnlyGlobal {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn no_such_method(method: &str) -> RuntimeError {
    RuntimeErrorKind::NoSuchMethod {
        method: method.to_string(),
    }
    .into()
}

#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> RuntimeError {
    RuntimeErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    }
    .into()
}

#[cold]
pub fn stack_underflow() -> RuntimeError {
    RuntimeErrorKind::StackUnderflow.into()
}

#[cold]
pub fn stack_overflow(what: &'static str, limit: usize) -> RuntimeError {
    RuntimeErrorKind::StackOverflow { what, limit }.into()
}

#[cold]
pub fn invalid_bytecode(detail: impl Into<String>) -> RuntimeError {
    RuntimeErrorKind::InvalidBytecode {
        detail: detail.into(),
    }
    .into()
}

/// Failure reported by a native function.
#[cold]
pub fn host_error(message: impl Into<String>) -> RuntimeError {
    RuntimeErrorKind::Host {
        message: message.into(),
    }
    .into()
}
