//! Bytecode: the linear instruction stream produced by the compiler.
//!
//! A [`CompiledUnit`] is produced once and is immutable afterwards; every
//! VM executing it shares the same instance. It holds:
//!
//! - the instruction sequence (top-level code at offset 0, functions after),
//! - the function table (name → entry offset, arity, local-slot count),
//! - the script-global table (names declared in the outermost top-level scope),
//! - the string pool (string literals and late-bound names).
//!
//! Jump targets are absolute instruction offsets.

mod disasm;

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ast::{BinaryOp, UnaryOp};

pub use disasm::disassemble;

/// Display name of the implicit top-level function.
pub const TOP_LEVEL_NAME: &str = "<top-level>";

// ID newtypes

/// Index into a unit's function table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FunctionId(u16);

impl FunctionId {
    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into a unit's script-global table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct GlobalId(u16);

impl GlobalId {
    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into a unit's string pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// Instructions

/// A single stack-machine instruction.
///
/// Stack effects are written `[before] -> [after]`, top of stack last.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    /// `[] -> [number]`
    PushNumber(f64),
    /// `[] -> [string]`
    PushString(StringId),
    /// `[] -> [bool]`
    PushBool(bool),
    /// `[] -> [void]`
    PushVoid,
    /// `[x] -> []`
    Pop,

    /// `[] -> [locals[slot]]`
    LoadLocal(u16),
    /// `[x] -> []`, `locals[slot] = x`
    StoreLocal(u16),
    /// `[] -> [globals[id]]`
    LoadGlobal(GlobalId),
    /// `[x] -> []`, `globals[id] = x`
    StoreGlobal(GlobalId),
    /// `[] -> [host global named by string]`, resolved at run time.
    LoadHost(StringId),
    /// `[x] -> []`, writes the host global named by string.
    StoreHost(StringId),

    /// `[x1 .. xn] -> [array]`
    MakeArray(u16),
    /// `[array, index] -> [element]`
    LoadIndex,
    /// `[value, array, index] -> [array']` where `array'[index] = value`.
    StoreIndex,

    /// `[x] -> [op x]`
    Unary(UnaryOp),
    /// `[lhs, rhs] -> [lhs op rhs]`; never a short-circuit operator.
    Binary(BinaryOp),

    /// Unconditional jump.
    Jump(u32),
    /// `[cond] -> []`, jumps when `cond` is not truthy.
    JumpIfFalse(u32),
    /// `[cond] -> []`, jumps when `cond` is truthy.
    JumpIfTrue(u32),
    /// For-loop step over the array held in local `array`, with the next
    /// position held in local `cursor`. Pushes the next element and
    /// advances the cursor, or jumps to `exit` when exhausted.
    IterNext { array: u16, cursor: u16, exit: u32 },

    /// `[a1 .. an] -> [result]`, calls a script function.
    CallScript { function: FunctionId, argc: u16 },
    /// `[a1 .. an] -> [result]`, calls an environment native by name.
    CallNative { name: StringId, argc: u16 },
    /// `[object, a1 .. an] -> [result]`, calls a method by name.
    CallMethod { name: StringId, argc: u16 },

    /// `[x] -> (caller) [x]`
    Return,
    /// `[] -> (caller) [void]`
    ReturnVoid,
}

impl Instruction {
    /// Upper-case mnemonic used in disassembly.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::PushNumber(_) => "PUSH_NUM",
            Instruction::PushString(_) => "PUSH_STR",
            Instruction::PushBool(_) => "PUSH_BOOL",
            Instruction::PushVoid => "PUSH_VOID",
            Instruction::Pop => "POP",
            Instruction::LoadLocal(_) => "LOAD_LOCAL",
            Instruction::StoreLocal(_) => "STORE_LOCAL",
            Instruction::LoadGlobal(_) => "LOAD_GLOBAL",
            Instruction::StoreGlobal(_) => "STORE_GLOBAL",
            Instruction::LoadHost(_) => "LOAD_HOST",
            Instruction::StoreHost(_) => "STORE_HOST",
            Instruction::MakeArray(_) => "MAKE_ARRAY",
            Instruction::LoadIndex => "LOAD_INDEX",
            Instruction::StoreIndex => "STORE_INDEX",
            Instruction::Unary(_) => "UNARY",
            Instruction::Binary(_) => "BINARY",
            Instruction::Jump(_) => "JMP",
            Instruction::JumpIfFalse(_) => "JMP_FALSE",
            Instruction::JumpIfTrue(_) => "JMP_TRUE",
            Instruction::IterNext { .. } => "ITER_NEXT",
            Instruction::CallScript { .. } => "CALL",
            Instruction::CallNative { .. } => "CALL_NATIVE",
            Instruction::CallMethod { .. } => "CALL_METHOD",
            Instruction::Return => "RET",
            Instruction::ReturnVoid => "RET_VOID",
        }
    }
}

// Function table

/// Function table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name: String,
    /// Offset of the first instruction.
    pub entry: u32,
    /// Number of declared parameters; they occupy slots `0..arity`.
    pub arity: u16,
    /// Local slots the frame needs, parameters included.
    pub locals: u16,
}

// Compiled unit

/// The immutable output of compilation.
#[derive(Clone, Debug)]
pub struct CompiledUnit {
    code: Vec<Instruction>,
    top_level: FunctionEntry,
    functions: Vec<FunctionEntry>,
    function_index: FxHashMap<String, FunctionId>,
    globals: Vec<String>,
    strings: Vec<Box<str>>,
}

impl CompiledUnit {
    /// Assemble a unit from its parts.
    ///
    /// `functions[i]` is addressed by `FunctionId::new(i)`. Names are
    /// expected to be unique; the compiler rejects duplicates before
    /// reaching this point.
    pub fn new(
        code: Vec<Instruction>,
        top_level: FunctionEntry,
        functions: Vec<FunctionEntry>,
        globals: Vec<String>,
        strings: Vec<Box<str>>,
    ) -> Self {
        let function_index = functions
            .iter()
            .zip(0u16..)
            .map(|(f, i)| (f.name.clone(), FunctionId::new(i)))
            .collect();
        CompiledUnit {
            code,
            top_level,
            functions,
            function_index,
            globals,
            strings,
        }
    }

    /// The full instruction sequence.
    #[inline]
    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    /// Instruction at `pc`, if in range.
    #[inline]
    pub fn instruction(&self, pc: usize) -> Option<Instruction> {
        self.code.get(pc).copied()
    }

    /// Entry for the implicit top-level function.
    #[inline]
    pub fn top_level(&self) -> &FunctionEntry {
        &self.top_level
    }

    /// All script functions, indexed by `FunctionId`.
    #[inline]
    pub fn functions(&self) -> &[FunctionEntry] {
        &self.functions
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> Option<&FunctionEntry> {
        self.functions.get(id.index())
    }

    pub fn function_by_name(&self, name: &str) -> Option<(FunctionId, &FunctionEntry)> {
        let id = *self.function_index.get(name)?;
        self.function(id).map(|entry| (id, entry))
    }

    /// Names of the script globals, indexed by `GlobalId`.
    #[inline]
    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    pub fn global_by_name(&self, name: &str) -> Option<GlobalId> {
        self.globals
            .iter()
            .zip(0u16..)
            .find(|(g, _)| g.as_str() == name)
            .map(|(_, i)| GlobalId::new(i))
    }

    #[inline]
    pub fn string(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.index()).map(AsRef::as_ref)
    }

    #[inline]
    pub fn strings(&self) -> &[Box<str>] {
        &self.strings
    }
}

impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&disassemble(self))
    }
}
