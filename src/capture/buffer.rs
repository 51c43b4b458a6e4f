//! Thread-local stack of output buffers.
//!
//! Code running inside a handler writes implicit output with [`write`] or
//! the [`echo!`](crate::echo) macro. Each open level buffers what is written
//! while it is the top of the stack; with no level open, output passes
//! through to stdout.

use std::cell::RefCell;
use std::fmt;
use std::io::Write as _;

thread_local! {
    static LEVELS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Number of buffering levels currently open on this thread.
pub fn depth() -> usize {
    LEVELS.with(|levels| levels.borrow().len())
}

/// Open a new buffering level and return the new depth.
pub fn push_level() -> usize {
    LEVELS.with(|levels| {
        let mut levels = levels.borrow_mut();
        levels.push(String::new());
        levels.len()
    })
}

/// Close the top level and return its contents.
pub fn pop_level() -> Option<String> {
    LEVELS.with(|levels| levels.borrow_mut().pop())
}

/// Write implicit output to the top level, or stdout if none is open.
pub fn write(text: &str) {
    let buffered = LEVELS.with(|levels| match levels.borrow_mut().last_mut() {
        Some(top) => {
            top.push_str(text);
            true
        }
        None => false,
    });
    if !buffered {
        let mut stdout = std::io::stdout().lock();
        // Implicit output has nowhere to report failures.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

#[doc(hidden)]
pub fn write_fmt(args: fmt::Arguments<'_>) {
    match args.as_str() {
        Some(s) => write(s),
        None => write(&args.to_string()),
    }
}

/// Write formatted implicit output, like `print!`, into the current capture.
#[macro_export]
macro_rules! echo {
    ($($arg:tt)*) => {
        $crate::capture::buffer::write_fmt(format_args!($($arg)*))
    };
}
