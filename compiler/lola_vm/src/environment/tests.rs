use std::cell::Cell;
use std::rc::Rc;

use super::{Environment, EnvironmentError};
use crate::errors::RuntimeErrorKind;
use crate::function::{CallOrImmediate, NativeFunction};
use crate::value::Value;

fn noop() -> NativeFunction {
    NativeFunction::new(|_| Ok(CallOrImmediate::void()))
}

#[test]
fn duplicate_registrations_are_rejected() {
    let mut env = Environment::new();
    env.register_native("Print", noop()).unwrap();
    assert_eq!(
        env.register_native("Print", noop()),
        Err(EnvironmentError::DuplicateNative("Print".to_string()))
    );

    env.register_global("x", Value::number(1.0)).unwrap();
    assert_eq!(
        env.register_computed_global("x", || Value::Void, None),
        Err(EnvironmentError::DuplicateGlobal("x".to_string()))
    );
}

#[test]
fn plain_global_reads_back_writes() {
    let mut env = Environment::new();
    env.register_global("x", Value::number(1.0)).unwrap();
    env.write_global("x", Value::string("hi")).unwrap();
    assert_eq!(env.read_global("x").unwrap(), Value::string("hi"));
}

#[test]
fn computed_global_runs_getter_on_every_read() {
    let reads = Rc::new(Cell::new(0.0));
    let counter = Rc::clone(&reads);
    let mut env = Environment::new();
    env.register_computed_global(
        "ticks",
        move || {
            counter.set(counter.get() + 1.0);
            Value::number(counter.get())
        },
        None,
    )
    .unwrap();

    assert_eq!(env.read_global("ticks").unwrap(), Value::number(1.0));
    assert_eq!(env.read_global("ticks").unwrap(), Value::number(2.0));
    assert_eq!(reads.get(), 2.0);
}

#[test]
fn computed_global_without_setter_is_read_only() {
    let mut env = Environment::new();
    env.register_computed_global("answer", || Value::number(42.0), None)
        .unwrap();
    let err = env.write_global("answer", Value::number(1.0)).unwrap_err();
    assert_eq!(
        err.kind,
        RuntimeErrorKind::ReadOnlyGlobal {
            name: "answer".to_string()
        }
    );
}

#[test]
fn computed_global_setter_receives_value() {
    let stored = Rc::new(Cell::new(0.0));
    let sink = Rc::clone(&stored);
    let source = Rc::clone(&stored);
    let mut env = Environment::new();
    env.register_computed_global(
        "level",
        move || Value::number(source.get()),
        Some(Box::new(move |v: Value| sink.set(v.as_number().unwrap_or(-1.0)))),
    )
    .unwrap();

    env.write_global("level", Value::number(7.0)).unwrap();
    assert_eq!(env.read_global("level").unwrap(), Value::number(7.0));
}

#[test]
fn missing_names() {
    let mut env = Environment::new();
    env.register_native("Print", noop()).unwrap();

    let err = env.read_global("nope").unwrap_err();
    assert!(matches!(err.kind, RuntimeErrorKind::UndefinedSymbol { .. }));

    let err = env.read_global("Print").unwrap_err();
    assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch { .. }));

    let err = env.write_global("nope", Value::Void).unwrap_err();
    assert!(matches!(err.kind, RuntimeErrorKind::UndefinedSymbol { .. }));
}
