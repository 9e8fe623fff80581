//! Destination for `print` output.
//!
//! The REPL and the `run` command write to stdout. Tests capture output
//! in a buffer, and constant folding runs natives with output discarded.
//! Enum dispatch keeps the hot `print` path free of vtable calls.

use std::sync::Arc;

use parking_lot::Mutex;

pub enum PrintHandler {
    Stdout,
    /// Captured output, for tests and embedding hosts.
    Buffer(Mutex<String>),
    Silent,
}

impl PrintHandler {
    /// Write `line` followed by a newline.
    pub fn println(&self, line: &str) {
        match self {
            PrintHandler::Stdout => println!("{line}"),
            PrintHandler::Buffer(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(line);
                buffer.push('\n');
            }
            PrintHandler::Silent => {}
        }
    }

    /// Everything captured so far. Empty unless this is a buffer.
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Buffer(buffer) => buffer.lock().clone(),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }

    /// Return the captured output and clear the buffer.
    pub fn take_output(&self) -> String {
        match self {
            PrintHandler::Buffer(buffer) => std::mem::take(&mut *buffer.lock()),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }
}

/// A print handler shared between a context and its host.
pub type SharedPrintHandler = Arc<PrintHandler>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_captures_lines() {
        let handler = buffer_handler();
        handler.println("hello");
        handler.println("world");
        assert_eq!(handler.output(), "hello\nworld\n");
    }

    #[test]
    fn take_output_clears_the_buffer() {
        let handler = buffer_handler();
        handler.println("once");
        assert_eq!(handler.take_output(), "once\n");
        assert_eq!(handler.output(), "");
    }

    #[test]
    fn silent_discards() {
        let handler = silent_handler();
        handler.println("nothing");
        assert_eq!(handler.output(), "");
    }

    #[test]
    fn shared_handle_sees_the_same_buffer() {
        let handler = buffer_handler();
        let other = Arc::clone(&handler);
        other.println("shared");
        assert_eq!(handler.output(), "shared\n");
    }
}
