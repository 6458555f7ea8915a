//! Statement and control-flow lowering.
//!
//! Loop shapes:
//!
//! ```text
//! while:  cond: <condition>; JMP_FALSE exit; <body>; JMP cond; exit:
//! for:    <source>; STORE arr; PUSH 0; STORE cursor;
//!         next: ITER_NEXT arr cursor exit; STORE var; <body>; JMP next; exit:
//! ```
//!
//! `continue` jumps to `cond` / `next`; `break` jumps to `exit`.

use lola_ir::{Expr, Instruction, Stmt};

use super::{FunctionLowerer, LoopContext};
use crate::builder::JumpPatch;
use crate::errors::{duplicate_declaration, CompileErrorKind};
use crate::scope::Declared;
use crate::stack::ensure_sufficient_stack;

impl<'a> FunctionLowerer<'_, 'a> {
    pub(super) fn lower_stmt(&mut self, stmt: &'a Stmt) -> Result<(), CompileErrorKind> {
        ensure_sufficient_stack(|| self.lower_stmt_inner(stmt))
    }

    fn lower_stmt_inner(&mut self, stmt: &'a Stmt) -> Result<(), CompileErrorKind> {
        match stmt {
            Stmt::Assign { target, value } => {
                if !target.is_assignable() {
                    return Err(CompileErrorKind::InvalidAssignmentTarget {
                        kind: target.kind_name(),
                    });
                }
                self.lower_expr(value)?;
                self.lower_store(target)
            }
            Stmt::Return(Some(value)) => {
                self.lower_expr(value)?;
                self.builder.emit(Instruction::Return);
                Ok(())
            }
            Stmt::Return(None) => {
                self.builder.emit(Instruction::ReturnVoid);
                Ok(())
            }
            Stmt::While { condition, body } => self.lower_while(condition, body),
            Stmt::For { var, source, body } => self.lower_for(var, source, body),
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => self.lower_if(condition, then_body, else_body.as_deref()),
            Stmt::Discard(value) => {
                self.lower_expr(value)?;
                self.builder.emit(Instruction::Pop);
                Ok(())
            }
            Stmt::Declare { name, init } => self.lower_declare(name, init.as_ref()),
            Stmt::Block(stmts) => self.scoped(|this| {
                for stmt in stmts {
                    if let Stmt::Declare { name, .. } = stmt {
                        this.scopes.announce(name);
                    }
                }
                for stmt in stmts {
                    this.lower_stmt(stmt)?;
                }
                Ok(())
            }),
            Stmt::Break => {
                if self.loops.is_empty() {
                    return Err(CompileErrorKind::BreakOutsideLoop);
                }
                let patch = self.builder.emit_forward(Instruction::Jump(0));
                if let Some(ctx) = self.loops.last_mut() {
                    ctx.breaks.push(patch);
                }
                Ok(())
            }
            Stmt::Continue => {
                let Some(ctx) = self.loops.last() else {
                    return Err(CompileErrorKind::ContinueOutsideLoop);
                };
                self.builder.emit(Instruction::Jump(ctx.continue_target));
                Ok(())
            }
        }
    }

    /// Run `f` inside a fresh lexical scope.
    fn scoped<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, CompileErrorKind>,
    ) -> Result<R, CompileErrorKind> {
        self.scopes.push();
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Run `f` as the body of a loop, then point its `break`s here.
    fn in_loop(
        &mut self,
        continue_target: u32,
        f: impl FnOnce(&mut Self) -> Result<(), CompileErrorKind>,
    ) -> Result<Vec<JumpPatch>, CompileErrorKind> {
        self.loops.push(LoopContext {
            continue_target,
            breaks: Vec::new(),
        });
        let result = f(self);
        let ctx = self.loops.pop();
        result?;
        Ok(ctx.map(|ctx| ctx.breaks).unwrap_or_default())
    }

    fn lower_declare(
        &mut self,
        name: &'a str,
        init: Option<&'a Expr>,
    ) -> Result<(), CompileErrorKind> {
        let global = if self.is_top_level() && self.scopes.is_outermost() {
            self.program.global(name)
        } else {
            None
        };
        if global.is_none() {
            // The initializer cannot see the name it initializes.
            self.scopes.announce(name);
        }

        match init {
            Some(init) => self.lower_expr(init)?,
            None => self.builder.emit(Instruction::PushVoid),
        }

        if let Some(id) = global {
            self.reached_globals.insert(id);
            self.builder.emit(Instruction::StoreGlobal(id));
            return Ok(());
        }

        match self.scopes.declare(name)? {
            Declared::Slot(slot) => {
                self.builder.emit(Instruction::StoreLocal(slot));
                Ok(())
            }
            Declared::Duplicate => Err(duplicate_declaration(name)),
        }
    }

    fn lower_if(
        &mut self,
        condition: &'a Expr,
        then_body: &'a Stmt,
        else_body: Option<&'a Stmt>,
    ) -> Result<(), CompileErrorKind> {
        self.lower_expr(condition)?;
        let skip_then = self.builder.emit_forward(Instruction::JumpIfFalse(0));
        self.scoped(|this| this.lower_stmt(then_body))?;

        match else_body {
            Some(else_body) => {
                let skip_else = self.builder.emit_forward(Instruction::Jump(0));
                self.builder.patch_here(skip_then)?;
                self.scoped(|this| this.lower_stmt(else_body))?;
                self.builder.patch_here(skip_else)
            }
            None => self.builder.patch_here(skip_then),
        }
    }

    fn lower_while(
        &mut self,
        condition: &'a Expr,
        body: &'a Stmt,
    ) -> Result<(), CompileErrorKind> {
        let cond = self.builder.offset()?;
        self.lower_expr(condition)?;
        let exit = self.builder.emit_forward(Instruction::JumpIfFalse(0));

        let breaks = self.in_loop(cond, |this| {
            this.scoped(|this| this.lower_stmt(body))?;
            this.builder.emit(Instruction::Jump(cond));
            Ok(())
        })?;

        self.builder.patch_here(exit)?;
        for patch in breaks {
            self.builder.patch_here(patch)?;
        }
        Ok(())
    }

    fn lower_for(
        &mut self,
        var: &'a str,
        source: &'a Expr,
        body: &'a Stmt,
    ) -> Result<(), CompileErrorKind> {
        self.lower_expr(source)?;
        self.scoped(|this| {
            let array = this.scopes.alloc_hidden()?;
            let cursor = this.scopes.alloc_hidden()?;
            this.builder.emit(Instruction::StoreLocal(array));
            this.builder.emit(Instruction::PushNumber(0.0));
            this.builder.emit(Instruction::StoreLocal(cursor));

            let Declared::Slot(slot) = this.scopes.declare(var)? else {
                return Err(duplicate_declaration(var));
            };

            let next = this.builder.offset()?;
            let exit = this.builder.emit_forward(Instruction::IterNext {
                array,
                cursor,
                exit: 0,
            });
            this.builder.emit(Instruction::StoreLocal(slot));

            let breaks = this.in_loop(next, |this| {
                this.scoped(|this| this.lower_stmt(body))?;
                this.builder.emit(Instruction::Jump(next));
                Ok(())
            })?;

            this.builder.patch_here(exit)?;
            for patch in breaks {
                this.builder.patch_here(patch)?;
            }
            Ok(())
        })
    }
}
