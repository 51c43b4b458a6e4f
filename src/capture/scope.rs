//! Scoped output capture.
//!
//! # Design Decisions
//! - The scope records the depth it started at and only unwinds levels above it
//! - `finish` folds every level above the start into the captured text
//! - Dropping an unfinished scope discards those levels (error or panic path)

use crate::capture::buffer;

/// A capture region opened on the current thread's buffer stack.
#[derive(Debug)]
pub struct CaptureScope {
    start_depth: usize,
    active: bool,
}

impl CaptureScope {
    /// Record the current depth and open a new level.
    pub fn begin() -> Self {
        let start_depth = buffer::depth();
        buffer::push_level();
        tracing::trace!(start_depth, "Capture scope opened");
        Self {
            start_depth,
            active: true,
        }
    }

    /// Depth recorded when the scope was opened.
    pub fn start_depth(&self) -> usize {
        self.start_depth
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Close every level opened inside this scope and return their text,
    /// outermost first.
    pub fn finish(mut self) -> String {
        let mut parts = Vec::new();
        while buffer::depth() > self.start_depth {
            match buffer::pop_level() {
                Some(text) => parts.push(text),
                None => break,
            }
        }
        self.active = false;
        parts.reverse();
        parts.concat()
    }

    fn discard(&mut self) {
        let mut discarded = 0usize;
        while buffer::depth() > self.start_depth {
            if buffer::pop_level().is_none() {
                break;
            }
            discarded += 1;
        }
        self.active = false;
        tracing::trace!(start_depth = self.start_depth, discarded, "Capture scope discarded");
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        if self.active {
            self.discard();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::buffer::{depth, pop_level, push_level, write};

    #[test]
    fn test_finish_returns_text() {
        let base = depth();
        let scope = CaptureScope::begin();
        write("abc");
        assert_eq!(scope.finish(), "abc");
        assert_eq!(depth(), base);
    }

    #[test]
    fn test_finish_folds_inner_levels() {
        let scope = CaptureScope::begin();
        write("outer-");
        push_level();
        write("inner");
        assert_eq!(scope.finish(), "outer-inner");
    }

    #[test]
    fn test_drop_discards_but_keeps_outer_levels() {
        push_level();
        write("harness ");
        let outer_depth = depth();
        {
            let _scope = CaptureScope::begin();
            write("partial");
            push_level();
        }
        assert_eq!(depth(), outer_depth);
        write("still here");
        assert_eq!(pop_level().as_deref(), Some("harness still here"));
    }

    #[test]
    fn test_drop_on_panic() {
        let base = depth();
        let result = std::panic::catch_unwind(|| {
            let _scope = CaptureScope::begin();
            write("partial");
            panic!("handler exploded");
        });
        assert!(result.is_err());
        assert_eq!(depth(), base);
    }

    #[test]
    fn test_scope_never_pops_below_start() {
        push_level();
        let outer_depth = depth();
        let scope = CaptureScope::begin();
        // Code inside the scope closes more levels than it opened.
        pop_level();
        pop_level();
        assert_eq!(scope.finish(), "");
        assert_eq!(depth(), outer_depth - 1);
    }
}
