//! Abstract syntax tree consumed by the compiler.
//!
//! The tree is produced by an external parser and is immutable once built.
//! Constructor helpers mirror the shape of the grammar so front ends (and
//! tests) can assemble programs without spelling out every `Box`.

mod operators;

pub use operators::{BinaryOp, UnaryOp};

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Reference to a named variable: `x`.
    Variable(String),
    /// Array element read: `array[index]`.
    ArrayIndex { array: Box<Expr>, index: Box<Expr> },
    /// Array literal: `[a, b, c]`.
    ArrayLiteral(Vec<Expr>),
    /// Call of a named function: `Name(args)`.
    Call { name: String, args: Vec<Expr> },
    /// Method call on an object: `object.Name(args)`.
    MethodCall {
        object: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    /// Number literal.
    Number(f64),
    /// String literal.
    String(String),
    /// Unary operator application.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operator application.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// `name`
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    /// A number literal.
    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    /// `[items...]`
    pub fn array(items: Vec<Expr>) -> Self {
        Expr::ArrayLiteral(items)
    }

    /// `array[index]`
    pub fn index(array: Expr, index: Expr) -> Self {
        Expr::ArrayIndex {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    /// `name(args...)`; bound to a script function or a native at compile time.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    /// `object.name(args...)`
    pub fn method(object: Expr, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            object: Box::new(object),
            name: name.into(),
            args,
        }
    }

    /// `op operand`
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// `lhs op rhs`
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Whether this expression may appear on the left of an assignment.
    ///
    /// Only variables and array elements whose root is itself assignable
    /// qualify.
    pub fn is_assignable(&self) -> bool {
        match self {
            Expr::Variable(_) => true,
            Expr::ArrayIndex { array, .. } => array.is_assignable(),
            _ => false,
        }
    }

    /// Short name of the expression kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Variable(_) => "variable",
            Expr::ArrayIndex { .. } => "array index",
            Expr::ArrayLiteral(_) => "array literal",
            Expr::Call { .. } => "function call",
            Expr::MethodCall { .. } => "method call",
            Expr::Number(_) => "number literal",
            Expr::String(_) => "string literal",
            Expr::Unary { .. } => "unary operator",
            Expr::Binary { .. } => "binary operator",
        }
    }
}

/// Statement node.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// `target = value;`
    Assign { target: Expr, value: Expr },
    /// `return;` or `return value;`
    Return(Option<Expr>),
    /// `while (condition) body`
    While { condition: Expr, body: Box<Stmt> },
    /// `for (var in source) body`
    For {
        var: String,
        source: Expr,
        body: Box<Stmt>,
    },
    /// `if (condition) then_body else else_body`
    If {
        condition: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    /// Expression evaluated for its side effects; the result is discarded.
    Discard(Expr),
    /// `var name;` or `var name = value;`
    Declare { name: String, init: Option<Expr> },
    /// Nested block introducing a new lexical scope.
    Block(Vec<Stmt>),
    /// `break;`
    Break,
    /// `continue;`
    Continue,
}

impl Stmt {
    /// `target = value;`
    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::Assign { target, value }
    }

    /// `return value;`
    pub fn ret(value: Expr) -> Self {
        Stmt::Return(Some(value))
    }

    /// `return;`
    pub fn ret_void() -> Self {
        Stmt::Return(None)
    }

    /// `while (condition) body`
    pub fn while_loop(condition: Expr, body: Stmt) -> Self {
        Stmt::While {
            condition,
            body: Box::new(body),
        }
    }

    /// `for (var in source) body`
    pub fn for_loop(var: impl Into<String>, source: Expr, body: Stmt) -> Self {
        Stmt::For {
            var: var.into(),
            source,
            body: Box::new(body),
        }
    }

    /// `if (condition) then_body`
    pub fn if_then(condition: Expr, then_body: Stmt) -> Self {
        Stmt::If {
            condition,
            then_body: Box::new(then_body),
            else_body: None,
        }
    }

    /// `if (condition) then_body else else_body`
    pub fn if_else(condition: Expr, then_body: Stmt, else_body: Stmt) -> Self {
        Stmt::If {
            condition,
            then_body: Box::new(then_body),
            else_body: Some(Box::new(else_body)),
        }
    }

    /// An expression evaluated for its side effects; the result is dropped.
    pub fn discard(value: Expr) -> Self {
        Stmt::Discard(value)
    }

    /// `var name;` or `var name = init;`
    pub fn declare(name: impl Into<String>, init: Option<Expr>) -> Self {
        Stmt::Declare {
            name: name.into(),
            init,
        }
    }

    /// `{ body... }`, a new lexical scope.
    pub fn block(body: Vec<Stmt>) -> Self {
        Stmt::Block(body)
    }
}

/// A named script function.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Stmt,
}

impl Function {
    pub fn new(name: impl Into<String>, params: &[&str], body: Stmt) -> Self {
        Function {
            name: name.into(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            body,
        }
    }
}

/// A complete program: named functions plus top-level statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(functions: Vec<Function>, statements: Vec<Stmt>) -> Self {
        Program {
            functions,
            statements,
        }
    }
}

#[cfg(test)]
mod tests;
