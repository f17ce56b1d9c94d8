use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::Line;
use crate::engine::ConfigError;

/// Hands out sending lines in round-robin order.
///
/// The line set is fixed at construction. The n-th call (0-indexed) to
/// [`LineAllocator::next_line`] returns `lines[n % len]`; the counter is
/// atomic, so the rotation holds even when records are dispatched
/// concurrently.
#[derive(Debug)]
pub struct LineAllocator {
    lines: Vec<Line>,
    cursor: AtomicUsize,
}

impl LineAllocator {
    /// Create an allocator over a non-empty ordered line set.
    pub fn new(lines: Vec<Line>) -> Result<Self, ConfigError> {
        if lines.is_empty() {
            return Err(ConfigError::NoLines);
        }
        Ok(Self {
            lines,
            cursor: AtomicUsize::new(0),
        })
    }

    /// The next line in rotation.
    pub fn next_line(&self) -> &Line {
        let n = self.cursor.fetch_add(1, Ordering::Relaxed);
        &self.lines[n % self.lines.len()]
    }

    /// The configured lines, in rotation order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of configured lines (always at least one).
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
