use lola_compiler::compile;
use lola_ir::{Function as AstFunction, Program, Stmt};

use super::{CallOrImmediate, Function, NativeFunction, ScriptFunction};
use crate::errors::RuntimeErrorKind;
use crate::value::Value;

#[test]
fn native_returns_immediate() {
    let double = NativeFunction::with_arity(1, |args| {
        let n = args[0].as_number().unwrap_or(0.0);
        Ok(Value::number(n * 2.0).into())
    });
    let f = Function::from(double);
    assert_eq!(f.arity(), Some(1));
    assert_eq!(
        f.call(&[Value::number(4.0)]).unwrap(),
        CallOrImmediate::Immediate(Value::number(8.0))
    );
}

#[test]
fn script_function_requests_invoke() {
    let unit = compile(&Program::new(
        vec![AstFunction::new("Twice", &["x"], Stmt::block(vec![]))],
        vec![],
    ))
    .unwrap();
    let script = ScriptFunction::lookup(&unit, "Twice").unwrap();
    assert_eq!(script.arity(), 1);

    let result = script.call(&[Value::number(1.0)]).unwrap();
    assert_eq!(
        result,
        CallOrImmediate::Invoke {
            function: script.id(),
            args: vec![Value::number(1.0)],
        }
    );

    let err = script.call(&[]).unwrap_err();
    assert!(matches!(err.kind, RuntimeErrorKind::ArityMismatch { .. }));
    assert!(ScriptFunction::lookup(&unit, "Missing").is_none());
}
