//! Bytecode emission.
//!
//! [`CodeBuilder`] owns the instruction stream and string pool while a
//! program is being lowered. Forward jumps are emitted with a placeholder
//! target and patched once the destination is known.

use lola_ir::{Instruction, StringId};
use rustc_hash::FxHashMap;

use crate::errors::{limit_exceeded, CompileErrorKind};

/// A forward jump waiting for its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "an unpatched jump targets offset 0"]
pub struct JumpPatch(usize);

/// Builder for the unit's shared instruction stream.
#[derive(Default)]
pub struct CodeBuilder {
    code: Vec<Instruction>,
    strings: Vec<Box<str>>,
    string_index: FxHashMap<Box<str>, StringId>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    #[inline]
    pub fn emit(&mut self, instr: Instruction) {
        self.code.push(instr);
    }

    /// Offset the next emitted instruction will occupy.
    pub fn offset(&self) -> Result<u32, CompileErrorKind> {
        u32::try_from(self.code.len())
            .map_err(|_| limit_exceeded("instructions", u32::MAX as usize))
    }

    /// Emit a jump-family instruction whose target is patched later.
    ///
    /// `instr` must be `Jump`, `JumpIfFalse`, `JumpIfTrue` or `IterNext`;
    /// its current target is ignored.
    pub fn emit_forward(&mut self, instr: Instruction) -> JumpPatch {
        debug_assert!(
            matches!(
                instr,
                Instruction::Jump(_)
                    | Instruction::JumpIfFalse(_)
                    | Instruction::JumpIfTrue(_)
                    | Instruction::IterNext { .. }
            ),
            "emit_forward called with non-jump {instr:?}"
        );
        let at = self.code.len();
        self.code.push(instr);
        JumpPatch(at)
    }

    /// Point a pending jump at the next instruction to be emitted.
    pub fn patch_here(&mut self, patch: JumpPatch) -> Result<(), CompileErrorKind> {
        let target = self.offset()?;
        if let Some(instr) = self.code.get_mut(patch.0) {
            match instr {
                Instruction::Jump(t) | Instruction::JumpIfFalse(t) | Instruction::JumpIfTrue(t) => {
                    *t = target;
                }
                Instruction::IterNext { exit, .. } => *exit = target,
                _ => {
                    tracing::warn!(offset = patch.0, "patch target is not a jump");
                }
            }
        }
        Ok(())
    }

    /// Intern a string into the unit's pool.
    pub fn intern(&mut self, s: &str) -> Result<StringId, CompileErrorKind> {
        if let Some(&id) = self.string_index.get(s) {
            return Ok(id);
        }
        let raw = u32::try_from(self.strings.len())
            .map_err(|_| limit_exceeded("strings", u32::MAX as usize))?;
        let id = StringId::new(raw);
        self.strings.push(s.into());
        self.string_index.insert(s.into(), id);
        Ok(id)
    }

    /// Consume the builder, yielding the instruction stream and string pool.
    pub fn finish(self) -> (Vec<Instruction>, Vec<Box<str>>) {
        (self.code, self.strings)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
