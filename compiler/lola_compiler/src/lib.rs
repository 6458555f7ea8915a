//! LoLa compiler - lowers a parsed [`Program`] into a [`CompiledUnit`].
//!
//! The compiler resolves every name it can statically: locals get frame
//! slots, outermost top-level declarations become script globals, and
//! script function calls are bound by id with their arity checked. Names
//! it cannot resolve are left for the VM to look up in the host
//! environment.
//!
//! Compilation is all-or-nothing: the first error aborts it and no unit is
//! produced.
//!
//! # Layout
//!
//! Top-level code is emitted first, starting at offset 0, followed by each
//! function in declaration order. Every body ends with `RET_VOID`, so
//! falling off the end returns `void`.

mod builder;
pub mod errors;
mod lower;
mod scope;
mod stack;

use lola_ir::{CompiledUnit, Program};

use crate::builder::CodeBuilder;
use crate::lower::{FunctionLowerer, ProgramInfo};

pub use errors::{CompileError, CompileErrorKind};

/// Compile `program` into an executable unit.
#[tracing::instrument(level = "debug", skip_all, fields(functions = program.functions.len()))]
pub fn compile(program: &Program) -> Result<CompiledUnit, CompileError> {
    let info = ProgramInfo::collect(program)?;
    let mut builder = CodeBuilder::new();

    let top_level = FunctionLowerer::lower_top_level(&mut builder, &info, &program.statements)?;

    let mut functions = Vec::with_capacity(program.functions.len());
    for function in &program.functions {
        functions.push(FunctionLowerer::lower_function(
            &mut builder,
            &info,
            function,
        )?);
    }

    let (code, strings) = builder.finish();
    tracing::debug!(
        instructions = code.len(),
        strings = strings.len(),
        "compilation finished"
    );
    Ok(CompiledUnit::new(
        code,
        top_level,
        functions,
        info.into_global_names(),
        strings,
    ))
}
