//! Output for the `Print` native.
//!
//! Output can go to stdout (the default), into a buffer that tests and
//! embedders read back, or nowhere.

use std::sync::Arc;

use lola_vm::{CallOrImmediate, Environment, EnvironmentError, NativeFunction, Value};
use parking_lot::Mutex;

/// Print handler that writes to stdout.
#[derive(Default)]
pub struct StdoutPrintHandler;

impl StdoutPrintHandler {
    pub fn println(&self, msg: &str) {
        println!("{msg}");
    }
}

/// Print handler that captures output in memory.
#[derive(Default)]
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn println(&self, msg: &str) {
        let mut buf = self.buffer.lock();
        buf.push_str(msg);
        buf.push('\n');
    }

    /// Everything printed so far.
    pub fn get_output(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

/// Print handler implementation using enum dispatch.
pub enum PrintHandlerImpl {
    Stdout(StdoutPrintHandler),
    Buffer(BufferPrintHandler),
    /// Discards all output.
    Silent,
}

impl PrintHandlerImpl {
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout(h) => h.println(msg),
            Self::Buffer(h) => h.println(msg),
            Self::Silent => {}
        }
    }

    /// Captured output; empty for handlers that don't capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(h) => h.get_output(),
            Self::Stdout(_) | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

/// Print handler shared between the host and the registered native.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout(StdoutPrintHandler))
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

/// Register `Print` in `env`, writing through `handler`.
///
/// Arguments are rendered with their display form, separated by single
/// spaces, and terminated by a newline. `Print` returns `void`.
pub fn register_print(
    env: &mut Environment,
    handler: SharedPrintHandler,
) -> Result<(), EnvironmentError> {
    env.register_native(
        "Print",
        NativeFunction::new(move |args| {
            let line = args
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            handler.println(&line);
            Ok(CallOrImmediate::void())
        }),
    )
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::{buffer_handler, register_print, silent_handler};
    use lola_vm::{Environment, Value};

    #[test]
    fn buffer_captures_space_joined_lines() {
        let handler = buffer_handler();
        let mut env = Environment::new();
        register_print(&mut env, handler.clone()).unwrap();

        let print = env.native("Print").unwrap();
        print
            .call(&[Value::number(5.0), Value::string("apples")])
            .unwrap();
        print.call(&[]).unwrap();

        assert_eq!(handler.get_output(), "5 apples\n\n");
        handler.clear();
        assert_eq!(handler.get_output(), "");
    }

    #[test]
    fn silent_discards() {
        let handler = silent_handler();
        handler.println("ignored");
        assert_eq!(handler.get_output(), "");
    }
}
