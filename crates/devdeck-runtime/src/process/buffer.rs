//! Bounded buffer of recent output lines.

use std::collections::VecDeque;

/// Fixed-capacity FIFO keeping the most recent lines.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl OutputBuffer {
    /// Create an empty buffer holding at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a line, evicting the oldest if at capacity.
    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Copy of the buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_most_recent_lines_in_order() {
        let capacity = 5;
        let mut buffer = OutputBuffer::new(capacity);
        for i in 0..capacity + 3 {
            buffer.push(format!("line {i}"));
        }

        assert_eq!(buffer.len(), capacity);
        assert_eq!(
            buffer.snapshot(),
            vec!["line 3", "line 4", "line 5", "line 6", "line 7"]
        );
    }

    #[test]
    fn test_under_capacity_keeps_everything() {
        let mut buffer = OutputBuffer::new(50);
        buffer.push("one".to_string());
        buffer.push("two".to_string());
        assert_eq!(buffer.snapshot(), vec!["one", "two"]);
        assert_eq!(buffer.capacity(), 50);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut buffer = OutputBuffer::new(0);
        buffer.push("dropped".to_string());
        assert!(buffer.is_empty());
    }
}
