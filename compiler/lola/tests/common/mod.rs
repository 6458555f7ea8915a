//! Shared fixtures for the end-to-end tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use lola::{
    compile, host_error, register_print, CallOrImmediate, CompiledUnit, Environment, ExecState,
    Function, NativeFunction, Object, Program, RuntimeError, SharedPrintHandler, Value,
    VirtualMachine,
};
use rustc_hash::FxHashMap;

/// Counter with `GetValue`, `Increment` and `Decrement`.
pub struct CounterObject {
    methods: FxHashMap<&'static str, Function>,
}

impl CounterObject {
    pub fn new() -> Self {
        let value = Rc::new(Cell::new(0.0));
        let mut methods: FxHashMap<&'static str, Function> = FxHashMap::default();

        let v = Rc::clone(&value);
        methods.insert(
            "GetValue",
            NativeFunction::with_arity(0, move |_| Ok(Value::number(v.get()).into())).into(),
        );
        let v = Rc::clone(&value);
        methods.insert(
            "Increment",
            NativeFunction::with_arity(0, move |_| {
                v.set(v.get() + 1.0);
                Ok(Value::number(v.get()).into())
            })
            .into(),
        );
        methods.insert(
            "Decrement",
            NativeFunction::with_arity(0, move |_| {
                value.set(value.get() - 1.0);
                Ok(Value::number(value.get()).into())
            })
            .into(),
        );
        CounterObject { methods }
    }
}

impl Object for CounterObject {
    fn get_function(&self, name: &str) -> Option<&Function> {
        self.methods.get(name)
    }
}

/// Stack with `GetSize`, `Push` and `Pop`.
pub struct StackObject {
    methods: FxHashMap<&'static str, Function>,
}

impl StackObject {
    pub fn new() -> Self {
        let contents: Rc<RefCell<Vec<Value>>> = Rc::default();
        let mut methods: FxHashMap<&'static str, Function> = FxHashMap::default();

        let c = Rc::clone(&contents);
        methods.insert(
            "GetSize",
            NativeFunction::with_arity(0, move |_| {
                #[expect(clippy::cast_precision_loss, reason = "test stacks are tiny")]
                let len = c.borrow().len() as f64;
                Ok(Value::number(len).into())
            })
            .into(),
        );
        let c = Rc::clone(&contents);
        methods.insert(
            "Push",
            NativeFunction::with_arity(1, move |args| {
                c.borrow_mut().push(args[0].clone());
                Ok(CallOrImmediate::void())
            })
            .into(),
        );
        methods.insert(
            "Pop",
            NativeFunction::with_arity(0, move |_| {
                let top = contents.borrow_mut().pop();
                top.map(CallOrImmediate::Immediate)
                    .ok_or_else(|| host_error("pop from an empty stack"))
            })
            .into(),
        );
        StackObject { methods }
    }
}

impl Object for StackObject {
    fn get_function(&self, name: &str) -> Option<&Function> {
        self.methods.get(name)
    }
}

/// `Print`, `CreateCounter`, `CreateStack`, the plain `RealGlobal` and the
/// read-only `ReadOnlyGlobal` (always 42).
pub fn demo_environment(print: SharedPrintHandler) -> Environment {
    let mut env = Environment::new();
    register_print(&mut env, print).unwrap();
    env.register_native(
        "CreateCounter",
        NativeFunction::with_arity(0, |_| Ok(Value::object(CounterObject::new()).into())),
    )
    .unwrap();
    env.register_native(
        "CreateStack",
        NativeFunction::with_arity(0, |_| Ok(Value::object(StackObject::new()).into())),
    )
    .unwrap();
    env.register_global("RealGlobal", Value::Void).unwrap();
    env.register_computed_global("ReadOnlyGlobal", || Value::number(42.0), None)
        .unwrap();
    env
}

pub fn compile_unit(program: &Program) -> Arc<CompiledUnit> {
    Arc::new(compile(program).unwrap())
}

/// Run to completion, returning the finished VM for inspection.
pub fn run<'e>(
    unit: Arc<CompiledUnit>,
    env: &'e Environment,
) -> Result<VirtualMachine<'e>, RuntimeError> {
    let mut vm = VirtualMachine::new(unit, env);
    lola::run_to_completion(&mut vm)?;
    assert_eq!(vm.state(), ExecState::Done);
    Ok(vm)
}
