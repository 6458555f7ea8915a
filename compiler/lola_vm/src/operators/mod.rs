//! Operator semantics.
//!
//! Operators never coerce between variants. Arithmetic takes two numbers,
//! ordering takes two numbers or two strings, and equality accepts any
//! pair (different variants are simply unequal).

use std::cmp::Ordering;
use std::rc::Rc;

use lola_ir::{BinaryOp, UnaryOp};

use crate::errors::{division_by_zero, index_out_of_range, type_mismatch, RuntimeError};
use crate::value::Value;

/// Apply a binary operator to two evaluated operands.
///
/// `and`/`or` are normally lowered to jumps; applied here they evaluate
/// both sides' truthiness and yield a boolean.
pub fn evaluate_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Equals => Ok(Value::Boolean(lhs == rhs)),
        BinaryOp::Differs => Ok(Value::Boolean(lhs != rhs)),
        BinaryOp::And => Ok(Value::Boolean(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Or => Ok(Value::Boolean(lhs.is_truthy() || rhs.is_truthy())),
        BinaryOp::Less | BinaryOp::More | BinaryOp::LessOrEqual | BinaryOp::GreaterOrEqual => {
            let ordering = compare(lhs, rhs)?;
            let result = match op {
                BinaryOp::Less => ordering == Some(Ordering::Less),
                BinaryOp::More => ordering == Some(Ordering::Greater),
                BinaryOp::LessOrEqual => {
                    matches!(ordering, Some(Ordering::Less | Ordering::Equal))
                }
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Value::Boolean(result))
        }
        BinaryOp::Plus => numeric_operands(lhs, rhs).map(|(a, b)| Value::Number(a + b)),
        BinaryOp::Minus => numeric_operands(lhs, rhs).map(|(a, b)| Value::Number(a - b)),
        BinaryOp::Multiply => numeric_operands(lhs, rhs).map(|(a, b)| Value::Number(a * b)),
        BinaryOp::Divide => {
            let (a, b) = nonzero_divisor(lhs, rhs)?;
            Ok(Value::Number(a / b))
        }
        BinaryOp::Modulus => {
            let (a, b) = nonzero_divisor(lhs, rhs)?;
            Ok(Value::Number(a % b))
        }
    }
}

fn numeric_operands(lhs: &Value, rhs: &Value) -> Result<(f64, f64), RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        (Value::Number(_), other) | (other, _) => Err(type_mismatch("number", other)),
    }
}

fn nonzero_divisor(lhs: &Value, rhs: &Value) -> Result<(f64, f64), RuntimeError> {
    let (a, b) = numeric_operands(lhs, rhs)?;
    if b == 0.0 {
        return Err(division_by_zero());
    }
    Ok((a, b))
}

/// Ordering between two numbers or two strings. `None` when a NaN is
/// involved, which makes every ordering test false.
fn compare(lhs: &Value, rhs: &Value) -> Result<Option<Ordering>, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Number(_), other) => Err(type_mismatch("number", other)),
        (Value::String(_), other) => Err(type_mismatch("string", other)),
        (other, _) => Err(type_mismatch("number or string", other)),
    }
}

pub fn evaluate_unary(op: UnaryOp, operand: &Value) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOp::Not, other) => Err(type_mismatch("boolean", other)),
        (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Negate, other) => Err(type_mismatch("number", other)),
    }
}

// Indexing

/// Convert an index operand to a position in `[0, len)`.
fn checked_index(index: &Value, len: usize) -> Result<usize, RuntimeError> {
    let Value::Number(n) = index else {
        return Err(type_mismatch("number", index));
    };
    #[expect(clippy::cast_precision_loss, reason = "array lengths stay far below 2^53")]
    let upper = len as f64;
    if n.fract() != 0.0 || *n < 0.0 || *n >= upper {
        return Err(index_out_of_range(*n, len));
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "range and integrality are checked above"
    )]
    let at = *n as usize;
    Ok(at)
}

/// `array[index]`
pub fn index(array: &Value, index: &Value) -> Result<Value, RuntimeError> {
    let Value::Array(items) = array else {
        return Err(type_mismatch("array", array));
    };
    let at = checked_index(index, items.len())?;
    Ok(items[at].clone())
}

/// `array[index] = value`, returning the updated array.
///
/// The storage is copied only if another value still shares it.
pub fn store_index(array: Value, index: &Value, value: Value) -> Result<Value, RuntimeError> {
    let Value::Array(mut items) = array else {
        return Err(type_mismatch("array", &array));
    };
    let at = checked_index(index, items.len())?;
    Rc::make_mut(&mut items)[at] = value;
    Ok(Value::Array(items))
}
