//! Call frames.

use lola_ir::FunctionId;
use smallvec::SmallVec;

use crate::errors::{invalid_bytecode, stack_overflow, stack_underflow, RuntimeError};
use crate::value::Value;

/// Call arguments popped off an operand stack.
pub type Args = SmallVec<[Value; 4]>;

/// One activation: operand stack, local slots and program counter.
pub struct Frame {
    /// `None` for the top-level frame.
    pub function: Option<FunctionId>,
    pub pc: usize,
    stack: Vec<Value>,
    locals: Vec<Value>,
}

impl Frame {
    pub fn new(function: Option<FunctionId>, pc: usize, locals: Vec<Value>) -> Self {
        Frame {
            function,
            pc,
            stack: Vec::new(),
            locals,
        }
    }

    /// Push onto the operand stack, failing once it holds `limit` values.
    #[inline]
    pub fn push(&mut self, value: Value, limit: usize) -> Result<(), RuntimeError> {
        if self.stack.len() >= limit {
            return Err(stack_overflow("operand stack", limit));
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop the top operand; an empty stack means malformed bytecode.
    #[inline]
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(stack_underflow)
    }

    /// Pop the top `n` values, keeping their push order.
    pub fn pop_n(&mut self, n: usize) -> Result<Args, RuntimeError> {
        let start = self
            .stack
            .len()
            .checked_sub(n)
            .ok_or_else(stack_underflow)?;
        Ok(self.stack.drain(start..).collect())
    }

    /// Read a local slot.
    pub fn local(&self, slot: u16) -> Result<&Value, RuntimeError> {
        self.locals
            .get(usize::from(slot))
            .ok_or_else(|| invalid_bytecode(format!("local slot {slot} out of range")))
    }

    /// Overwrite a local slot.
    pub fn set_local(&mut self, slot: u16, value: Value) -> Result<(), RuntimeError> {
        let local = self
            .locals
            .get_mut(usize::from(slot))
            .ok_or_else(|| invalid_bytecode(format!("local slot {slot} out of range")))?;
        *local = value;
        Ok(())
    }
}
