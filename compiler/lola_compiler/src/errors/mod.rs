//! Compile errors.
//!
//! A compile error aborts the whole compilation; no partial unit is
//! produced. Each error carries the name of the function it was found in
//! (`None` for top-level code).

use std::fmt;

use lola_ir::TOP_LEVEL_NAME;
use thiserror::Error;

/// Typed compile error category.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    #[error("undefined variable `{name}`: used before its declaration")]
    UndefinedVariable { name: String },
    #[error("`{name}` is already declared in this scope")]
    DuplicateDeclaration { name: String },
    #[error("function `{name}` is defined more than once")]
    DuplicateFunction { name: String },
    #[error("parameter `{name}` is declared more than once")]
    DuplicateParameter { name: String },
    #[error("cannot assign to a {kind}")]
    InvalidAssignmentTarget { kind: &'static str },
    #[error("`break` outside of a loop")]
    BreakOutsideLoop,
    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("too many {what} (limit {limit})")]
    LimitExceeded { what: &'static str, limit: usize },
}

/// A compile error with its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// Enclosing function, `None` for top-level code.
    pub function: Option<String>,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, function: Option<&str>) -> Self {
        CompileError {
            kind,
            function: function.map(str::to_string),
        }
    }

    /// Display name of the location.
    pub fn location(&self) -> &str {
        self.function.as_deref().unwrap_or(TOP_LEVEL_NAME)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error in {}: {}", self.location(), self.kind)
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

// Constructors

#[cold]
pub fn undefined_variable(name: &str) -> CompileErrorKind {
    CompileErrorKind::UndefinedVariable {
        name: name.to_string(),
    }
}

#[cold]
pub fn duplicate_declaration(name: &str) -> CompileErrorKind {
    CompileErrorKind::DuplicateDeclaration {
        name: name.to_string(),
    }
}

#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> CompileErrorKind {
    CompileErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    }
}

#[cold]
pub fn limit_exceeded(what: &'static str, limit: usize) -> CompileErrorKind {
    CompileErrorKind::LimitExceeded { what, limit }
}
