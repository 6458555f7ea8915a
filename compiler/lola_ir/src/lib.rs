//! LoLa IR - AST and bytecode types for the LoLa scripting toolchain.
//!
//! This crate provides the two representations shared by the rest of the
//! workspace:
//!
//! - **AST** ([`Program`], [`Function`], [`Stmt`], [`Expr`]): the already
//!   parsed tree handed to the compiler by an external front end.
//! - **Bytecode** ([`CompiledUnit`], [`Instruction`]): the linear,
//!   immutable output of `lola_compiler`, executed by `lola_vm`.
//!
//! Neither representation carries execution semantics; operator meaning,
//! values and the call protocol live in `lola_vm`.

pub mod ast;
pub mod bytecode;

pub use ast::{BinaryOp, Expr, Function, Program, Stmt, UnaryOp};
pub use bytecode::{
    disassemble, CompiledUnit, FunctionEntry, FunctionId, GlobalId, Instruction, StringId,
    TOP_LEVEL_NAME,
};
