//! Compile-and-run tests against the demo environment.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lola::ast::Function;
use lola::{
    buffer_handler, run_program, BinaryOp, CallOrImmediate, CompileErrorKind, Environment,
    ExecState, Expr, LolaError, NativeFunction, Program, RuntimeErrorKind, ScriptFunction, Stmt,
    Value, VirtualMachine,
};
use pretty_assertions::assert_eq;

use common::{compile_unit, demo_environment, run};

fn n(value: f64) -> Expr {
    Expr::number(value)
}

fn print(args: Vec<Expr>) -> Stmt {
    Stmt::discard(Expr::call("Print", args))
}

#[test]
fn sum_is_printed() {
    let handler = buffer_handler();
    let env = demo_environment(handler.clone());
    let program = Program::new(
        vec![Function::new(
            "Sum",
            &["a", "b"],
            Stmt::block(vec![Stmt::ret(Expr::binary(
                BinaryOp::Plus,
                Expr::var("a"),
                Expr::var("b"),
            ))]),
        )],
        vec![print(vec![Expr::call("Sum", vec![n(2.0), n(3.0)])])],
    );
    run_program(&program, &env).unwrap();
    assert_eq!(handler.get_output(), "5\n");
}

#[test]
fn sum_reaches_recording_native_as_single_argument() {
    let recorded: Rc<RefCell<Vec<Vec<Value>>>> = Rc::default();
    let sink = Rc::clone(&recorded);
    let mut env = Environment::new();
    env.register_native(
        "Print",
        NativeFunction::new(move |args| {
            sink.borrow_mut().push(args.to_vec());
            Ok(CallOrImmediate::void())
        }),
    )
    .unwrap();
    let program = Program::new(
        vec![Function::new(
            "Sum",
            &["a", "b"],
            Stmt::block(vec![Stmt::ret(Expr::binary(
                BinaryOp::Plus,
                Expr::var("a"),
                Expr::var("b"),
            ))]),
        )],
        vec![print(vec![Expr::call("Sum", vec![n(2.0), n(3.0)])])],
    );
    run_program(&program, &env).unwrap();
    assert_eq!(*recorded.borrow(), vec![vec![Value::number(5.0)]]);
}

#[test]
fn counter_and_stack_objects() {
    let handler = buffer_handler();
    let env = demo_environment(handler.clone());
    let counter = || Expr::var("counter");
    let stack = || Expr::var("stack");
    let statements = vec![
        Stmt::declare("counter", Some(Expr::call("CreateCounter", vec![]))),
        Stmt::discard(Expr::method(counter(), "Increment", vec![])),
        Stmt::discard(Expr::method(counter(), "Increment", vec![])),
        Stmt::discard(Expr::method(counter(), "Decrement", vec![])),
        print(vec![Expr::method(counter(), "GetValue", vec![])]),
        Stmt::declare("stack", Some(Expr::call("CreateStack", vec![]))),
        Stmt::for_loop(
            "item",
            Expr::array(vec![n(1.0), Expr::string("two"), n(3.0)]),
            Stmt::block(vec![Stmt::discard(Expr::method(
                stack(),
                "Push",
                vec![Expr::var("item")],
            ))]),
        ),
        print(vec![Expr::method(stack(), "GetSize", vec![])]),
        print(vec![
            Expr::method(stack(), "Pop", vec![]),
            Expr::method(stack(), "Pop", vec![]),
        ]),
    ];
    run_program(&Program::new(vec![], statements), &env).unwrap();
    assert_eq!(handler.get_output(), "1\n3\n3 two\n");
}

#[test]
fn native_failure_surfaces_as_host_error() {
    let env = demo_environment(buffer_handler());
    let statements = vec![
        Stmt::declare("stack", Some(Expr::call("CreateStack", vec![]))),
        Stmt::discard(Expr::method(Expr::var("stack"), "Pop", vec![])),
    ];
    let err = run_program(&Program::new(vec![], statements), &env).unwrap_err();
    let err = match err {
        LolaError::Runtime(err) => err,
        other => panic!("expected a runtime error, got {other}"),
    };
    assert_eq!(
        err.kind,
        RuntimeErrorKind::Host {
            message: "pop from an empty stack".to_string()
        }
    );
    assert!(err.pc.is_some());
}

#[test]
fn real_and_read_only_globals() {
    let handler = buffer_handler();
    let env = demo_environment(handler.clone());
    let statements = vec![
        Stmt::assign(Expr::var("RealGlobal"), Expr::string("set by script")),
        print(vec![Expr::var("RealGlobal"), Expr::var("ReadOnlyGlobal")]),
    ];
    run_program(&Program::new(vec![], statements), &env).unwrap();
    assert_eq!(handler.get_output(), "set by script 42\n");
    assert_eq!(env.global("RealGlobal"), Some(Value::string("set by script")));

    let statements = vec![Stmt::assign(Expr::var("ReadOnlyGlobal"), n(1.0))];
    let err = run_program(&Program::new(vec![], statements), &env).unwrap_err();
    assert!(matches!(
        err,
        LolaError::Runtime(ref e) if e.kind == RuntimeErrorKind::ReadOnlyGlobal {
            name: "ReadOnlyGlobal".to_string()
        }
    ));
}

#[test]
fn computed_getter_is_not_cached() {
    let ticks = Rc::new(Cell::new(0.0));
    let source = Rc::clone(&ticks);
    let handler = buffer_handler();
    let mut env = demo_environment(handler.clone());
    env.register_computed_global(
        "Tick",
        move || {
            source.set(source.get() + 1.0);
            Value::number(source.get())
        },
        None,
    )
    .unwrap();

    let statements = vec![print(vec![Expr::var("Tick"), Expr::var("Tick"), Expr::var("Tick")])];
    run_program(&Program::new(vec![], statements), &env).unwrap();
    assert_eq!(handler.get_output(), "1 2 3\n");
}

#[test]
fn native_callback_into_script() {
    let program = Program::new(
        vec![Function::new(
            "Square",
            &["x"],
            Stmt::block(vec![Stmt::ret(Expr::binary(
                BinaryOp::Multiply,
                Expr::var("x"),
                Expr::var("x"),
            ))]),
        )],
        vec![Stmt::declare("r", Some(Expr::call("Callback", vec![n(7.0)])))],
    );
    let unit = compile_unit(&program);
    let square = ScriptFunction::lookup(&unit, "Square").unwrap();
    let mut env = Environment::new();
    env.register_native("Callback", NativeFunction::with_arity(1, move |args| square.call(args)))
        .unwrap();

    let mut vm = VirtualMachine::new(unit, &env);
    let before = vm.call_depth();
    let mut deepest = before;
    while vm.exec().unwrap() == ExecState::Running {
        deepest = deepest.max(vm.call_depth());
        if vm.global("r") == Some(Value::number(49.0)) {
            assert_eq!(vm.call_depth(), before);
        }
    }
    assert_eq!(deepest, before + 1);
    assert_eq!(vm.global("r"), Some(Value::number(49.0)));
}

#[test]
fn index_out_of_range() {
    let env = Environment::new();
    for (items, index) in [(vec![1.0, 2.0, 3.0], 5.0), (vec![1.0], -1.0)] {
        let array = Expr::array(items.into_iter().map(Expr::number).collect());
        let statements = vec![Stmt::discard(Expr::index(array, n(index)))];
        let err = run(compile_unit(&Program::new(vec![], statements)), &env)
            .err()
            .expect("indexing should fault");
        assert!(
            matches!(err.kind, RuntimeErrorKind::IndexOutOfRange { .. }),
            "unexpected {err}"
        );
    }
}

#[test]
fn floating_point_is_ieee() {
    let handler = buffer_handler();
    let env = demo_environment(handler.clone());
    let third = Expr::binary(BinaryOp::Divide, n(1.0), n(3.0));
    let statements = vec![
        Stmt::declare("x", Some(Expr::binary(BinaryOp::Multiply, third, n(3.0)))),
        print(vec![Expr::var("x")]),
    ];
    let vm = run(compile_unit(&Program::new(vec![], statements)), &env).unwrap();
    let x = vm.global("x").and_then(|v| v.as_number()).unwrap();
    assert!((x - 1.0).abs() < f64::EPSILON * 4.0);
}

#[test]
fn compile_errors_stop_before_execution() {
    let handler = buffer_handler();
    let env = demo_environment(handler.clone());
    let statements = vec![print(vec![Expr::string("never")]), Stmt::Break];
    let err = run_program(&Program::new(vec![], statements), &env).unwrap_err();
    assert!(matches!(
        err,
        LolaError::Compile(ref e) if e.kind == CompileErrorKind::BreakOutsideLoop
    ));
    assert_eq!(handler.get_output(), "");
}

#[test]
fn disassembly_is_deterministic() {
    let program = Program::new(
        vec![Function::new("Id", &["x"], Stmt::block(vec![Stmt::ret(Expr::var("x"))]))],
        vec![
            Stmt::declare("r", Some(Expr::call("Id", vec![Expr::string("s")]))),
            Stmt::while_loop(Expr::var("r"), Stmt::block(vec![Stmt::Break])),
        ],
    );
    let unit = compile_unit(&program);
    let first = lola::disassemble(&unit);
    let second = lola::disassemble(&compile_unit(&program));
    assert_eq!(first, second);
    assert_eq!(first, unit.to_string());

    let instruction_lines = first
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .count();
    let header_lines = first.lines().count() - instruction_lines;
    assert_eq!(instruction_lines, unit.code().len());
    assert_eq!(header_lines, 2);
}
