//! Host objects.

use std::fmt;
use std::rc::Rc;

use crate::function::Function;

/// Capability interface for values that expose named methods.
///
/// Scripts reach methods only through method-call expressions
/// (`obj.Name(args)`). The object owns its method table; the returned
/// function is borrowed for the duration of the call.
pub trait Object {
    fn get_function(&self, name: &str) -> Option<&Function>;
}

/// Shared handle to a host object.
#[derive(Clone)]
pub struct ObjectRef(Rc<dyn Object>);

impl ObjectRef {
    pub fn new(object: impl Object + 'static) -> Self {
        ObjectRef(Rc::new(object))
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.0.get_function(name)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this object.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Rc::as_ptr(&self.0))
    }
}
