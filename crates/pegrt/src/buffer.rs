//! # Position Buffer
//!
//! A bounded, absolute-position-addressable sliding window over the
//! input stream. Backtracking rewinds into the window; cut/commit
//! ([`WindowBuffer::flush`]) discards it, bounding memory for long or
//! streaming input once a grammar has committed progress.
//!
//! Positions are absolute over the whole stream: the readable range is
//! exactly `start..start + len`, where `start` only ever grows (through
//! capacity eviction or a flush). Reads below `start` refer to evicted
//! elements and are gone for good; reads at or beyond the end refer to
//! elements not yet appended.

use crate::error::{ConfigError, ParseError};
use std::collections::VecDeque;

/// A bounded window over an append-only stream, addressed by absolute
/// position.
#[derive(Debug, Clone)]
pub struct WindowBuffer<T> {
    items: VecDeque<T>,
    start: usize,
    capacity: usize,
}

impl<T> WindowBuffer<T> {
    /// Create a window holding at most `capacity` elements.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                what: "window buffer",
            });
        }
        Ok(Self {
            items: VecDeque::new(),
            start: 0,
            capacity,
        })
    }

    /// Extend the stream by one element. At capacity, the oldest buffered
    /// element is evicted and `start` advances by one.
    pub fn append(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
            self.start += 1;
        }
        self.items.push_back(item);
    }

    /// Read the element at absolute position `position`.
    pub fn read(&self, position: usize) -> Result<&T, ParseError> {
        let index = self.index_of(position)?;
        Ok(&self.items[index])
    }

    /// Overwrite the element at absolute position `position`.
    pub fn write(&mut self, position: usize, item: T) -> Result<(), ParseError> {
        let index = self.index_of(position)?;
        self.items[index] = item;
        Ok(())
    }

    /// Remove and return the element at absolute position `position`.
    /// Later elements shift down one position.
    pub fn delete(&mut self, position: usize) -> Result<T, ParseError> {
        let index = self.index_of(position)?;
        self.items
            .remove(index)
            .ok_or_else(|| ParseError::fatal("window index invalidated during delete"))
    }

    /// Irrevocably discard every buffered element and advance `start`
    /// past them. This is the cut/commit boundary: no rewind before the
    /// new `start` is possible afterwards.
    pub fn flush(&mut self) {
        self.start += self.items.len();
        self.items.clear();
    }

    /// First readable absolute position. Monotonically non-decreasing.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last readable absolute position.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.items.len()
    }

    /// Number of currently buffered elements. Never exceeds the
    /// configured capacity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count of every element ever appended: `start + len`.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.end()
    }

    /// Iterate the buffered elements with their absolute positions.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(offset, item)| (self.start + offset, item))
    }

    fn index_of(&self, position: usize) -> Result<usize, ParseError> {
        if position < self.start || position >= self.end() {
            return Err(ParseError::OutOfWindow {
                position,
                start: self.start,
                end: self.end(),
            });
        }
        Ok(position - self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(WindowBuffer::<u8>::new(0).is_err());
    }

    #[test]
    fn test_append_within_capacity() {
        let mut buffer = WindowBuffer::new(4).unwrap();
        for b in b"abc" {
            buffer.append(*b);
        }
        assert_eq!(buffer.start(), 0);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.read(1), Ok(&b'b'));
    }

    #[test]
    fn test_append_evicts_oldest_at_capacity() {
        let mut buffer = WindowBuffer::new(2).unwrap();
        buffer.append('a');
        buffer.append('b');
        buffer.append('c');
        assert_eq!(buffer.start(), 1);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.total_len(), 3);
        assert!(matches!(
            buffer.read(0),
            Err(ParseError::OutOfWindow { position: 0, .. })
        ));
        assert_eq!(buffer.read(2), Ok(&'c'));
    }

    #[test]
    fn test_write_and_delete_rebase() {
        let mut buffer = WindowBuffer::new(8).unwrap();
        for b in b"abcd" {
            buffer.append(*b);
        }
        buffer.write(1, b'B').unwrap();
        assert_eq!(buffer.read(1), Ok(&b'B'));

        assert_eq!(buffer.delete(1), Ok(b'B'));
        // Later elements shift down one position.
        assert_eq!(buffer.read(1), Ok(&b'c'));
        assert_eq!(buffer.read(2), Ok(&b'd'));
        assert!(buffer.read(3).is_err());
    }

    #[test]
    fn test_flush_forbids_rewind() {
        let mut buffer = WindowBuffer::new(8).unwrap();
        for b in b"abc" {
            buffer.append(*b);
        }
        buffer.flush();
        assert_eq!(buffer.start(), 3);
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.total_len(), 3);
        for position in 0..3 {
            assert!(buffer.read(position).is_err());
        }
        buffer.append(b'd');
        assert_eq!(buffer.read(3), Ok(&b'd'));
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut buffer = WindowBuffer::new(3).unwrap();
        for i in 0..100 {
            buffer.append(i);
            assert!(buffer.len() <= 3);
        }
        assert_eq!(buffer.start(), 97);
        assert_eq!(buffer.total_len(), 100);
    }
}
