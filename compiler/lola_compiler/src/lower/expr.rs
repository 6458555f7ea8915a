//! Expression lowering and assignment stores.

use lola_ir::{BinaryOp, Expr, Instruction};

use super::{FunctionLowerer, Resolved};
use crate::errors::{arity_mismatch, limit_exceeded, CompileErrorKind};
use crate::stack::ensure_sufficient_stack;

impl<'a> FunctionLowerer<'_, 'a> {
    /// Lower `expr`, leaving exactly one value on the operand stack.
    pub(super) fn lower_expr(&mut self, expr: &'a Expr) -> Result<(), CompileErrorKind> {
        ensure_sufficient_stack(|| self.lower_expr_inner(expr))
    }

    fn lower_expr_inner(&mut self, expr: &'a Expr) -> Result<(), CompileErrorKind> {
        match expr {
            Expr::Number(value) => self.builder.emit(Instruction::PushNumber(*value)),
            Expr::String(value) => {
                let id = self.builder.intern(value)?;
                self.builder.emit(Instruction::PushString(id));
            }
            Expr::Variable(name) => self.lower_load(name)?,
            Expr::ArrayIndex { array, index } => {
                self.lower_expr(array)?;
                self.lower_expr(index)?;
                self.builder.emit(Instruction::LoadIndex);
            }
            Expr::ArrayLiteral(items) => {
                let count = self.lower_args(items)?;
                self.builder.emit(Instruction::MakeArray(count));
            }
            Expr::Call { name, args } => self.lower_call(name, args)?,
            Expr::MethodCall { object, name, args } => {
                self.lower_expr(object)?;
                let argc = self.lower_args(args)?;
                let name = self.builder.intern(name)?;
                self.builder.emit(Instruction::CallMethod { name, argc });
            }
            Expr::Unary { op, operand } => {
                self.lower_expr(operand)?;
                self.builder.emit(Instruction::Unary(*op));
            }
            Expr::Binary { op, lhs, rhs } if op.is_short_circuit() => {
                self.lower_short_circuit(*op, lhs, rhs)?;
            }
            Expr::Binary { op, lhs, rhs } => {
                self.lower_expr(lhs)?;
                self.lower_expr(rhs)?;
                self.builder.emit(Instruction::Binary(*op));
            }
        }
        Ok(())
    }

    /// Lower each argument in order, returning the count.
    fn lower_args(&mut self, args: &'a [Expr]) -> Result<u16, CompileErrorKind> {
        let count = u16::try_from(args.len())
            .map_err(|_| limit_exceeded("arguments", usize::from(u16::MAX)))?;
        for arg in args {
            self.lower_expr(arg)?;
        }
        Ok(count)
    }

    /// Script functions are bound statically; anything else is a native
    /// looked up in the environment at call time.
    fn lower_call(&mut self, name: &'a str, args: &'a [Expr]) -> Result<(), CompileErrorKind> {
        if let Some(sig) = self.program.function(name) {
            if usize::from(sig.arity) != args.len() {
                return Err(arity_mismatch(name, usize::from(sig.arity), args.len()));
            }
            let argc = self.lower_args(args)?;
            self.builder.emit(Instruction::CallScript {
                function: sig.id,
                argc,
            });
        } else {
            let argc = self.lower_args(args)?;
            let name = self.builder.intern(name)?;
            self.builder.emit(Instruction::CallNative { name, argc });
        }
        Ok(())
    }

    /// `lhs and rhs` / `lhs or rhs`, always yielding a boolean.
    ///
    /// ```text
    /// and:  lhs; JMP_FALSE F; rhs; JMP_FALSE F; PUSH true; JMP end; F: PUSH false
    /// or:   lhs; JMP_TRUE  T; rhs; JMP_TRUE  T; PUSH false; JMP end; T: PUSH true
    /// ```
    fn lower_short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: &'a Expr,
        rhs: &'a Expr,
    ) -> Result<(), CompileErrorKind> {
        let is_and = op == BinaryOp::And;
        let decide = if is_and {
            Instruction::JumpIfFalse(0)
        } else {
            Instruction::JumpIfTrue(0)
        };

        self.lower_expr(lhs)?;
        let first = self.builder.emit_forward(decide);
        self.lower_expr(rhs)?;
        let second = self.builder.emit_forward(decide);
        self.builder.emit(Instruction::PushBool(is_and));
        let end = self.builder.emit_forward(Instruction::Jump(0));
        self.builder.patch_here(first)?;
        self.builder.patch_here(second)?;
        self.builder.emit(Instruction::PushBool(!is_and));
        self.builder.patch_here(end)
    }

    fn lower_load(&mut self, name: &str) -> Result<(), CompileErrorKind> {
        let instr = match self.resolve(name)? {
            Resolved::Local(slot) => Instruction::LoadLocal(slot),
            Resolved::Global(id) => Instruction::LoadGlobal(id),
            Resolved::Host => Instruction::LoadHost(self.builder.intern(name)?),
        };
        self.builder.emit(instr);
        Ok(())
    }

    /// Store the value on top of the stack into `target`.
    ///
    /// Element stores rebuild the array and store it back into its own
    /// target, so `a[i][j] = v` updates `a`.
    pub(super) fn lower_store(&mut self, target: &'a Expr) -> Result<(), CompileErrorKind> {
        match target {
            Expr::Variable(name) => {
                let instr = match self.resolve(name)? {
                    Resolved::Local(slot) => Instruction::StoreLocal(slot),
                    Resolved::Global(id) => Instruction::StoreGlobal(id),
                    Resolved::Host => Instruction::StoreHost(self.builder.intern(name)?),
                };
                self.builder.emit(instr);
                Ok(())
            }
            Expr::ArrayIndex { array, index } if array.is_assignable() => {
                self.lower_expr(array)?;
                self.lower_expr(index)?;
                self.builder.emit(Instruction::StoreIndex);
                ensure_sufficient_stack(|| self.lower_store(array))
            }
            other => Err(CompileErrorKind::InvalidAssignmentTarget {
                kind: other.kind_name(),
            }),
        }
    }
}
