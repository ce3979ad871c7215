//! Fixed-Size Circular Buffer
//!
//! ## Overview
//!
//! The edge loop keeps two short histories: the last few raw sound readings
//! for the moving average, and the last couple of seconds of dynamic
//! acceleration for the raw window attached to an emission. Both want the
//! same thing: constant memory decided at compile time, O(1) insertion that
//! silently drops the oldest entry, and chronological iteration.
//!
//! ### Why Not `heapless::Deque`?
//!
//! A deque returns an error when full. For sensor history the newest data is
//! the valuable part, so overwriting is the behavior we want, and doing it
//! here keeps every caller free of "pop then push" bookkeeping.
//!
//! ### Memory Layout
//!
//! ```text
//! CircularBuffer<T, 5>:
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  0  │  1  │  2  │  3  │  4  │  ← Option<T> slots
//! └─────┴─────┴─────┴─────┴─────┘
//!    ↑
//!    └── write_pos, wraps after N writes
//! ```
//!
//! Slots are `Option<T>` so no `unsafe` is needed for uninitialized storage.
//!
//! ## Usage Example
//!
//! ```rust
//! use quakesense_core::buffer::CircularBuffer;
//!
//! let mut sound: CircularBuffer<u16, 4> = CircularBuffer::new();
//! for level in [100, 120, 130, 140, 150] {
//!     sound.push(level);
//! }
//!
//! // Oldest reading (100) was overwritten
//! let levels: Vec<u16> = sound.iter().copied().collect();
//! assert_eq!(levels, vec![120, 130, 140, 150]);
//! assert_eq!(sound.last(), Some(&150));
//! ```

/// Fixed-size ring buffer that overwrites its oldest entry when full
///
/// ## Internal Invariants
///
/// - `write_pos < N`
/// - `len <= N`
/// - iteration yields entries oldest to newest
#[derive(Clone)]
pub struct CircularBuffer<T: Copy, const N: usize> {
    data: [Option<T>; N],
    write_pos: usize,
    len: usize,
}

impl<T: Copy, const N: usize> CircularBuffer<T, N> {
    /// Creates a new empty buffer
    ///
    /// Usable in static contexts:
    /// ```rust
    /// use quakesense_core::buffer::CircularBuffer;
    /// static HISTORY: CircularBuffer<u16, 8> = CircularBuffer::new();
    /// ```
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Adds an entry, overwriting the oldest one when full
    pub fn push(&mut self, item: T) {
        if N == 0 {
            return;
        }
        self.data[self.write_pos] = Some(item);
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Compile-time capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }

        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };
        self.data[idx].as_ref()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> CircularBufferIter<'_, T, N> {
        CircularBufferIter {
            buffer: self,
            index: 0,
        }
    }

    /// Iterate over the newest `n` entries, oldest first
    pub fn recent(&self, n: usize) -> CircularBufferIter<'_, T, N> {
        CircularBufferIter {
            buffer: self,
            index: self.len.saturating_sub(n),
        }
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.data = [None; N];
        self.write_pos = 0;
        self.len = 0;
    }

    /// Entry by logical index (0 = oldest)
    ///
    /// ```text
    /// Physical:  [D, E, A, B, C]  (write_pos = 2, full)
    /// Logical:   [A, B, C, D, E]
    /// logical[i] = physical[(write_pos + i) % N]
    /// ```
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }

        let actual_index = if self.len < N {
            index
        } else {
            (self.write_pos + index) % N
        };

        self.data[actual_index].as_ref()
    }
}

/// Iterator over circular buffer contents
pub struct CircularBufferIter<'a, T: Copy, const N: usize> {
    buffer: &'a CircularBuffer<T, N>,
    index: usize,
}

impl<'a, T: Copy, const N: usize> Iterator for CircularBufferIter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, T: Copy, const N: usize> ExactSizeIterator for CircularBufferIter<'a, T, N> {}

impl<T: Copy, const N: usize> Default for CircularBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer: CircularBuffer<u16, 5> = CircularBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert!(buffer.last().is_none());
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn circular_overwrite() {
        let mut buffer = CircularBuffer::<u32, 3>::new();
        for i in 0..5 {
            buffer.push(i);
        }

        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());

        let values: Vec<u32> = buffer.iter().copied().collect();
        assert_eq!(values, vec![2, 3, 4]);
        assert_eq!(buffer.last(), Some(&4));
    }

    #[test]
    fn recent_takes_newest_in_order() {
        let mut buffer = CircularBuffer::<u32, 8>::new();
        for i in 0..10 {
            buffer.push(i);
        }

        let values: Vec<u32> = buffer.recent(3).copied().collect();
        assert_eq!(values, vec![7, 8, 9]);

        // Asking for more than stored yields everything
        let mut short = CircularBuffer::<u32, 8>::new();
        short.push(1);
        short.push(2);
        assert_eq!(short.recent(5).count(), 2);
    }

    #[test]
    fn clear_resets() {
        let mut buffer = CircularBuffer::<u8, 4>::new();
        buffer.push(1);
        buffer.push(2);
        buffer.clear();
        assert!(buffer.is_empty());
        buffer.push(9);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![9]);
    }
}
