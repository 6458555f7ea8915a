//! AST to bytecode lowering.
//!
//! Lowering runs one [`FunctionLowerer`] per script function plus one for
//! the top-level statements, all appending to a shared [`CodeBuilder`].
//!
//! # Name resolution
//!
//! A variable reference resolves, in order, to:
//!
//! 1. a local slot in the current function (innermost scope first),
//! 2. a script global (an outermost top-level declaration),
//! 3. a deferred host lookup by name, resolved by the VM against the
//!    environment.
//!
//! A name that a still-open scope declares further on is rejected rather
//! than deferred to the host. At top level, the same applies to script
//! globals whose declaration has not been reached. Names whose block has
//! already closed fall through to the later tiers.

mod control_flow;
mod expr;

use lola_ir::{FunctionEntry, FunctionId, GlobalId, Instruction, Program, Stmt};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builder::{CodeBuilder, JumpPatch};
use crate::errors::{
    duplicate_declaration, limit_exceeded, undefined_variable, CompileError, CompileErrorKind,
};
use crate::scope::{Declared, ScopeStack};

// Program-wide tables

/// Signature of a script function, as seen by call sites.
#[derive(Clone, Copy)]
pub struct FunctionSig {
    pub id: FunctionId,
    pub arity: u16,
}

/// Function and global tables built before any code is lowered.
pub struct ProgramInfo<'a> {
    functions: FxHashMap<&'a str, FunctionSig>,
    globals: FxHashMap<&'a str, GlobalId>,
    global_names: Vec<String>,
}

impl<'a> ProgramInfo<'a> {
    /// Collect the function table and the script globals.
    pub fn collect(program: &'a Program) -> Result<Self, CompileError> {
        let mut functions = FxHashMap::default();
        for (index, function) in program.functions.iter().enumerate() {
            let id = u16::try_from(index)
                .map(FunctionId::new)
                .map_err(|_| top_level_error(limit_exceeded("functions", usize::from(u16::MAX))))?;
            let arity = u16::try_from(function.params.len()).map_err(|_| {
                CompileError::new(
                    limit_exceeded("parameters", usize::from(u16::MAX)),
                    Some(function.name.as_str()),
                )
            })?;
            if functions
                .insert(function.name.as_str(), FunctionSig { id, arity })
                .is_some()
            {
                return Err(top_level_error(CompileErrorKind::DuplicateFunction {
                    name: function.name.clone(),
                }));
            }
        }

        let mut globals = FxHashMap::default();
        let mut global_names = Vec::new();
        for stmt in &program.statements {
            if let Stmt::Declare { name, .. } = stmt {
                let id = u16::try_from(global_names.len())
                    .map(GlobalId::new)
                    .map_err(|_| top_level_error(limit_exceeded("globals", usize::from(u16::MAX))))?;
                if globals.insert(name.as_str(), id).is_some() {
                    return Err(top_level_error(duplicate_declaration(name)));
                }
                global_names.push(name.clone());
            }
        }

        Ok(ProgramInfo {
            functions,
            globals,
            global_names,
        })
    }

    pub fn function(&self, name: &str) -> Option<FunctionSig> {
        self.functions.get(name).copied()
    }

    pub fn global(&self, name: &str) -> Option<GlobalId> {
        self.globals.get(name).copied()
    }

    pub fn into_global_names(self) -> Vec<String> {
        self.global_names
    }
}

fn top_level_error(kind: CompileErrorKind) -> CompileError {
    CompileError::new(kind, None)
}

// Per-function lowering

/// Jump bookkeeping for the innermost enclosing loop.
struct LoopContext {
    continue_target: u32,
    breaks: Vec<JumpPatch>,
}

/// Where a variable reference resolved to.
#[derive(Clone, Copy)]
enum Resolved {
    Local(u16),
    Global(GlobalId),
    Host,
}

/// Lowers one function body (or the top-level statements).
pub struct FunctionLowerer<'p, 'a> {
    builder: &'p mut CodeBuilder,
    program: &'p ProgramInfo<'a>,
    scopes: ScopeStack,
    loops: Vec<LoopContext>,
    /// `None` while lowering top-level code.
    name: Option<&'a str>,
    /// Script globals whose declaration has been lowered (top level only).
    reached_globals: FxHashSet<GlobalId>,
}

impl<'p, 'a> FunctionLowerer<'p, 'a> {
    fn new(
        builder: &'p mut CodeBuilder,
        program: &'p ProgramInfo<'a>,
        name: Option<&'a str>,
    ) -> Self {
        FunctionLowerer {
            builder,
            program,
            scopes: ScopeStack::new(),
            loops: Vec::new(),
            name,
            reached_globals: FxHashSet::default(),
        }
    }

    /// Lower the top-level statements. Their code must start at offset 0.
    pub fn lower_top_level(
        builder: &'p mut CodeBuilder,
        program: &'p ProgramInfo<'a>,
        statements: &'a [Stmt],
    ) -> Result<FunctionEntry, CompileError> {
        let mut lowerer = FunctionLowerer::new(builder, program, None);
        lowerer.lower_body(&[], statements).map_err(top_level_error)
    }

    /// Lower a named script function.
    pub fn lower_function(
        builder: &'p mut CodeBuilder,
        program: &'p ProgramInfo<'a>,
        function: &'a lola_ir::Function,
    ) -> Result<FunctionEntry, CompileError> {
        let body = std::slice::from_ref(&function.body);
        let mut lowerer = FunctionLowerer::new(builder, program, Some(function.name.as_str()));
        lowerer
            .lower_body(&function.params, body)
            .map_err(|kind| CompileError::new(kind, Some(function.name.as_str())))
    }

    fn lower_body(
        &mut self,
        params: &'a [String],
        body: &'a [Stmt],
    ) -> Result<FunctionEntry, CompileErrorKind> {
        let entry = self.builder.offset()?;
        for param in params {
            if self.scopes.declare(param)? == Declared::Duplicate {
                return Err(CompileErrorKind::DuplicateParameter {
                    name: param.clone(),
                });
            }
        }
        for stmt in body {
            self.lower_stmt(stmt)?;
        }
        self.builder.emit(Instruction::ReturnVoid);

        let name = self.name.unwrap_or(lola_ir::TOP_LEVEL_NAME);
        let arity = u16::try_from(params.len())
            .map_err(|_| limit_exceeded("parameters", usize::from(u16::MAX)))?;
        let locals = self.scopes.max_slots();
        tracing::debug!(
            function = name,
            arity,
            locals,
            start = entry,
            end = self.builder.offset()?,
            "lowered function"
        );
        Ok(FunctionEntry {
            name: name.to_string(),
            entry,
            arity,
            locals,
        })
    }

    fn is_top_level(&self) -> bool {
        self.name.is_none()
    }

    /// Resolve a variable reference at the current point.
    fn resolve(&self, name: &str) -> Result<Resolved, CompileErrorKind> {
        if let Some(slot) = self.scopes.lookup(name) {
            return Ok(Resolved::Local(slot));
        }
        if let Some(id) = self.program.global(name) {
            if !self.is_top_level() || self.reached_globals.contains(&id) {
                return Ok(Resolved::Global(id));
            }
            return Err(undefined_variable(name));
        }
        if self.scopes.is_pending(name) {
            return Err(undefined_variable(name));
        }
        Ok(Resolved::Host)
    }
}
