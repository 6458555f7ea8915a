//! LoLa - an embeddable scripting core.
//!
//! This crate ties the toolchain together for hosts:
//!
//! ```text
//! parse (external) -> Program -> compile -> CompiledUnit
//!                                              |
//!                         Environment -> VirtualMachine::exec() until Done
//! ```
//!
//! It re-exports the pieces a host needs, provides the driver loop
//! ([`run_to_completion`], [`run_program`]), the `Print` native
//! ([`register_print`]) and tracing setup ([`init_tracing`]).
//!
//! Set `RUST_LOG=lola_vm=trace` to log every executed instruction.

mod print_handler;

use std::sync::{Arc, Once};

use thiserror::Error;

pub use lola_compiler::{compile, CompileError, CompileErrorKind};
pub use lola_ir::ast;
pub use lola_ir::{disassemble, BinaryOp, CompiledUnit, Expr, Program, Stmt, UnaryOp};
pub use lola_vm::{
    CallOrImmediate, Environment, EnvironmentError, ExecState, Function, NativeFunction, Object,
    ObjectRef, RuntimeError, RuntimeErrorKind, ScriptFunction, Value, VirtualMachine, VmConfig,
};
pub use lola_vm::errors::host_error;
pub use print_handler::{
    buffer_handler, register_print, silent_handler, stdout_handler, BufferPrintHandler,
    PrintHandlerImpl, SharedPrintHandler, StdoutPrintHandler,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Failure of a whole compile-and-run cycle.
#[derive(Debug, Error)]
pub enum LolaError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Drive `vm` until it finishes or faults.
pub fn run_to_completion(vm: &mut VirtualMachine<'_>) -> Result<(), RuntimeError> {
    let mut steps: u64 = 0;
    while vm.exec()? == ExecState::Running {
        steps += 1;
    }
    tracing::debug!(steps, "script finished");
    Ok(())
}

/// Compile `program` and run it against `env` to completion.
///
/// Returns the compiled unit so the caller can inspect or re-run it.
pub fn run_program(
    program: &Program,
    env: &Environment,
) -> Result<Arc<CompiledUnit>, LolaError> {
    let unit = Arc::new(compile(program)?);
    let mut vm = VirtualMachine::new(Arc::clone(&unit), env);
    if let Err(err) = run_to_completion(&mut vm) {
        tracing::debug!(error = %err, "script faulted");
        return Err(err.into());
    }
    Ok(unit)
}
