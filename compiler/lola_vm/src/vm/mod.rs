//! The virtual machine.
//!
//! A [`VirtualMachine`] executes one [`CompiledUnit`] against a borrowed
//! [`Environment`]. The host drives it by calling [`VirtualMachine::exec`]
//! until it reports [`ExecState::Done`]; each call executes exactly one
//! instruction, so the host may stop between any two instructions.
//!
//! # Calls
//!
//! Script-to-script calls push a frame. Natives and object methods return
//! a [`CallOrImmediate`]: an immediate value is pushed onto the caller's
//! operand stack, an `Invoke` pushes a frame for the requested script
//! function. Either way the dispatch loop never recurses on the host
//! stack; when the pushed frame returns, its value lands where the call
//! result was expected.
//!
//! # Faults
//!
//! A runtime error discards the call stack and leaves the VM faulted.
//! Every later `exec` returns the same error.

mod frame;

use std::rc::Rc;
use std::sync::Arc;

use lola_ir::{CompiledUnit, FunctionId, Instruction, StringId, TOP_LEVEL_NAME};

use self::frame::{Args, Frame};
use crate::config::VmConfig;
use crate::environment::Environment;
use crate::errors::{
    arity_mismatch, invalid_bytecode, no_such_method, stack_overflow, stack_underflow,
    type_mismatch, undefined_symbol, Backtrace, BacktraceFrame, RuntimeError,
};
use crate::function::{CallOrImmediate, Function, ScriptFunction};
use crate::operators::{evaluate_binary, evaluate_unary, index, store_index};
use crate::value::Value;

/// Observable execution state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecState {
    Running,
    Done,
    /// Stopped by a runtime error; not resumable.
    Faulted,
}

enum Status {
    Running,
    Done,
    Faulted(RuntimeError),
}

/// Executes one [`CompiledUnit`] against a borrowed [`Environment`].
///
/// Each VM owns its script globals and call stack; several VMs may share
/// the same unit and environment. Drive it with [`VirtualMachine::exec`]
/// until it reports [`ExecState::Done`] or returns an error.
pub struct VirtualMachine<'env> {
    unit: Arc<CompiledUnit>,
    env: &'env Environment,
    config: VmConfig,
    /// String pool materialized as shareable values.
    strings: Vec<Rc<str>>,
    /// Script globals, indexed by `GlobalId`.
    globals: Vec<Value>,
    frames: Vec<Frame>,
    status: Status,
}

impl<'env> VirtualMachine<'env> {
    /// Create a VM positioned at the start of the top-level code, with
    /// default limits.
    pub fn new(unit: Arc<CompiledUnit>, env: &'env Environment) -> Self {
        Self::with_config(unit, env, VmConfig::default())
    }

    /// Create a VM with explicit call-depth and operand-stack limits.
    pub fn with_config(unit: Arc<CompiledUnit>, env: &'env Environment, config: VmConfig) -> Self {
        let top = unit.top_level();
        let top_frame = Frame::new(
            None,
            top.entry as usize,
            vec![Value::Void; usize::from(top.locals)],
        );
        let strings = unit.strings().iter().map(|s| Rc::from(&**s)).collect();
        let globals = vec![Value::Void; unit.globals().len()];
        tracing::debug!(
            instructions = unit.code().len(),
            globals = globals.len(),
            "vm created"
        );
        VirtualMachine {
            unit,
            env,
            config,
            strings,
            globals,
            frames: vec![top_frame],
            status: Status::Running,
        }
    }

    // Accessors

    pub fn state(&self) -> ExecState {
        match self.status {
            Status::Running => ExecState::Running,
            Status::Done => ExecState::Done,
            Status::Faulted(_) => ExecState::Faulted,
        }
    }

    /// The error that stopped the VM, if any.
    pub fn fault(&self) -> Option<&RuntimeError> {
        match &self.status {
            Status::Faulted(err) => Some(err),
            Status::Running | Status::Done => None,
        }
    }

    /// Number of live frames, the top-level frame included.
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Current value of a script global or, failing that, a host global.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.unit
            .global_by_name(name)
            .and_then(|id| self.globals.get(id.index()).cloned())
            .or_else(|| self.env.global(name))
    }

    /// Handle for calling back into a script function of this unit.
    pub fn script_function(&self, name: &str) -> Option<ScriptFunction> {
        ScriptFunction::lookup(&self.unit, name)
    }

    // Execution

    /// Execute one instruction and report the resulting state.
    pub fn exec(&mut self) -> Result<ExecState, RuntimeError> {
        match &self.status {
            Status::Running => {}
            Status::Done => return Ok(ExecState::Done),
            Status::Faulted(err) => return Err(err.clone()),
        }

        let pc = self.frames.last().map_or(0, |frame| frame.pc);
        match self.step() {
            Ok(()) => Ok(self.state()),
            Err(err) => {
                let err = err.with_location(pc, self.backtrace(pc));
                tracing::debug!(error = %err, "vm faulted");
                self.frames.clear();
                self.status = Status::Faulted(err.clone());
                Err(err)
            }
        }
    }

    fn step(&mut self) -> Result<(), RuntimeError> {
        let limit = self.config.max_operand_stack;
        let env = self.env;
        let depth = self.frames.len();
        let frame = self.frames.last_mut().ok_or_else(stack_underflow)?;
        let pc = frame.pc;
        let instr = self
            .unit
            .instruction(pc)
            .ok_or_else(|| invalid_bytecode(format!("no instruction at {pc:04}")))?;
        tracing::trace!(depth, pc, ?instr, "exec");
        frame.pc += 1;

        match instr {
            Instruction::PushNumber(n) => frame.push(Value::Number(n), limit),
            Instruction::PushString(id) => {
                let s = self
                    .strings
                    .get(id.index())
                    .ok_or_else(|| bad_string(id))?;
                frame.push(Value::String(Rc::clone(s)), limit)
            }
            Instruction::PushBool(b) => frame.push(Value::Boolean(b), limit),
            Instruction::PushVoid => frame.push(Value::Void, limit),
            Instruction::Pop => frame.pop().map(drop),

            Instruction::LoadLocal(slot) => {
                let value = frame.local(slot)?.clone();
                frame.push(value, limit)
            }
            Instruction::StoreLocal(slot) => {
                let value = frame.pop()?;
                frame.set_local(slot, value)
            }
            Instruction::LoadGlobal(id) => {
                let value = self
                    .globals
                    .get(id.index())
                    .cloned()
                    .ok_or_else(|| invalid_bytecode(format!("global {} out of range", id.raw())))?;
                frame.push(value, limit)
            }
            Instruction::StoreGlobal(id) => {
                let value = frame.pop()?;
                let slot = self
                    .globals
                    .get_mut(id.index())
                    .ok_or_else(|| invalid_bytecode(format!("global {} out of range", id.raw())))?;
                *slot = value;
                Ok(())
            }
            Instruction::LoadHost(id) => {
                let value = env.read_global(name_at(&self.unit, id)?)?;
                frame.push(value, limit)
            }
            Instruction::StoreHost(id) => {
                let value = frame.pop()?;
                env.write_global(name_at(&self.unit, id)?, value)
            }

            Instruction::MakeArray(count) => {
                let items = frame.pop_n(usize::from(count))?;
                frame.push(Value::array(items.into_vec()), limit)
            }
            Instruction::LoadIndex => {
                let at = frame.pop()?;
                let array = frame.pop()?;
                frame.push(index(&array, &at)?, limit)
            }
            Instruction::StoreIndex => {
                let at = frame.pop()?;
                let array = frame.pop()?;
                let value = frame.pop()?;
                frame.push(store_index(array, &at, value)?, limit)
            }

            Instruction::Unary(op) => {
                let operand = frame.pop()?;
                frame.push(evaluate_unary(op, &operand)?, limit)
            }
            Instruction::Binary(op) => {
                let rhs = frame.pop()?;
                let lhs = frame.pop()?;
                frame.push(evaluate_binary(op, &lhs, &rhs)?, limit)
            }

            Instruction::Jump(target) => {
                frame.pc = target as usize;
                Ok(())
            }
            Instruction::JumpIfFalse(target) => {
                if !frame.pop()?.is_truthy() {
                    frame.pc = target as usize;
                }
                Ok(())
            }
            Instruction::JumpIfTrue(target) => {
                if frame.pop()?.is_truthy() {
                    frame.pc = target as usize;
                }
                Ok(())
            }
            Instruction::IterNext {
                array,
                cursor,
                exit,
            } => {
                let position = match frame.local(cursor)? {
                    Value::Number(n) => *n,
                    other => return Err(type_mismatch("number", other)),
                };
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "the cursor only ever holds a non-negative count"
                )]
                let at = position as usize;
                let next = match frame.local(array)? {
                    Value::Array(items) => items.get(at).cloned(),
                    other => return Err(type_mismatch("array", other)),
                };
                match next {
                    Some(item) => {
                        frame.set_local(cursor, Value::Number(position + 1.0))?;
                        frame.push(item, limit)
                    }
                    None => {
                        frame.pc = exit as usize;
                        Ok(())
                    }
                }
            }

            Instruction::CallScript { function, argc } => {
                let args = frame.pop_n(usize::from(argc))?;
                self.enter(function, args)
            }
            Instruction::CallNative { name, argc } => {
                let args = frame.pop_n(usize::from(argc))?;
                let name = name_at(&self.unit, name)?;
                let function = env.native(name).ok_or_else(|| undefined_symbol(name))?;
                let result = call_checked(function, name, &args)?;
                self.complete(result)
            }
            Instruction::CallMethod { name, argc } => {
                let args = frame.pop_n(usize::from(argc))?;
                let object = match frame.pop()? {
                    Value::Object(object) => object,
                    other => return Err(type_mismatch("object", &other)),
                };
                let name = name_at(&self.unit, name)?;
                let function = object
                    .get_function(name)
                    .ok_or_else(|| no_such_method(name))?;
                let result = call_checked(function, name, &args)?;
                self.complete(result)
            }

            Instruction::Return => {
                let value = frame.pop()?;
                self.leave(value)
            }
            Instruction::ReturnVoid => self.leave(Value::Void),
        }
    }

    /// Deliver the outcome of a native or method call.
    fn complete(&mut self, result: CallOrImmediate) -> Result<(), RuntimeError> {
        match result {
            CallOrImmediate::Immediate(value) => {
                let limit = self.config.max_operand_stack;
                self.frames
                    .last_mut()
                    .ok_or_else(stack_underflow)?
                    .push(value, limit)
            }
            CallOrImmediate::Invoke { function, args } => self.enter(function, args),
        }
    }

    /// Push a frame for a script function.
    fn enter<I>(&mut self, id: FunctionId, args: I) -> Result<(), RuntimeError>
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: ExactSizeIterator,
    {
        let args = args.into_iter();
        let entry = self
            .unit
            .function(id)
            .ok_or_else(|| invalid_bytecode(format!("no function with id {}", id.raw())))?;
        let arity = usize::from(entry.arity);
        if args.len() != arity {
            return Err(arity_mismatch(&entry.name, arity, args.len()));
        }
        if self.frames.len() >= self.config.max_call_depth {
            return Err(stack_overflow("call stack", self.config.max_call_depth));
        }

        let slots = usize::from(entry.locals).max(arity);
        let mut locals = Vec::with_capacity(slots);
        locals.extend(args);
        locals.resize(slots, Value::Void);

        tracing::debug!(
            function = %entry.name,
            depth = self.frames.len() + 1,
            "enter frame"
        );
        self.frames
            .push(Frame::new(Some(id), entry.entry as usize, locals));
        Ok(())
    }

    /// Pop the current frame, handing `value` to the caller.
    fn leave(&mut self, value: Value) -> Result<(), RuntimeError> {
        let frame = self.frames.pop().ok_or_else(stack_underflow)?;
        tracing::debug!(
            function = self.function_name(frame.function),
            depth = self.frames.len(),
            "leave frame"
        );
        match self.frames.last_mut() {
            Some(caller) => caller.push(value, self.config.max_operand_stack),
            None => {
                self.status = Status::Done;
                Ok(())
            }
        }
    }

    fn function_name(&self, id: Option<FunctionId>) -> &str {
        id.and_then(|id| self.unit.function(id))
            .map_or(TOP_LEVEL_NAME, |entry| entry.name.as_str())
    }

    /// Backtrace of the live frames, innermost first. Callers report the
    /// offset of their pending call instruction.
    fn backtrace(&self, pc: usize) -> Backtrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .enumerate()
            .map(|(i, frame)| BacktraceFrame {
                function: self.function_name(frame.function).to_string(),
                pc: if i == 0 { pc } else { frame.pc.saturating_sub(1) },
            })
            .collect();
        Backtrace::new(frames)
    }
}

/// Call `function`, enforcing its declared arity first.
fn call_checked(
    function: &Function,
    name: &str,
    args: &Args,
) -> Result<CallOrImmediate, RuntimeError> {
    if let Some(expected) = function.arity() {
        if expected != args.len() {
            return Err(arity_mismatch(name, expected, args.len()));
        }
    }
    function.call(args)
}

fn name_at(unit: &CompiledUnit, id: StringId) -> Result<&str, RuntimeError> {
    unit.string(id).ok_or_else(|| bad_string(id))
}

#[cold]
fn bad_string(id: StringId) -> RuntimeError {
    invalid_bytecode(format!("string {} out of range", id.raw()))
}
