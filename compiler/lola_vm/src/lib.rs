//! LoLa VM - executes compiled LoLa bytecode.
//!
//! - [`value`]: the runtime [`Value`] union and the [`Object`] capability.
//! - [`function`]: native and script callables and the [`CallOrImmediate`]
//!   call protocol.
//! - [`environment`]: host natives and globals, plain or computed.
//! - [`vm`]: the single-stepping [`VirtualMachine`].
//!
//! Execution is single-threaded. Values hold `Rc`s, so a VM and everything
//! it touches stay on the thread that created them; only the immutable
//! [`CompiledUnit`](lola_ir::CompiledUnit) may be shared across threads.

mod config;
pub mod environment;
pub mod errors;
pub mod function;
pub mod operators;
pub mod value;
pub mod vm;

pub use config::VmConfig;
pub use environment::{Environment, EnvironmentError};
pub use errors::{Backtrace, BacktraceFrame, RuntimeError, RuntimeErrorKind};
pub use function::{CallOrImmediate, Function, NativeFunction, ScriptFunction};
pub use value::{Object, ObjectRef, Value};
pub use vm::{ExecState, VirtualMachine};
