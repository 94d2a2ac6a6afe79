//! Read-ahead ring buffer.
//!
//! Holds bytes consumed while checking for an in-stream notification so they
//! can be handed back to the payload reader, in order, when the check turns
//! out to be ordinary data.

/// Capacity of the driver's read-ahead buffer. Must hold the longest
/// notification marker.
pub const PEEK_CAPACITY: usize = 8;

/// Fixed-capacity FIFO of bytes.
///
/// Invariant: `count <= N`. `head` is the next slot to write, `tail` the next
/// slot to read.
#[derive(Debug, Clone)]
pub struct PeekBuffer<const N: usize = PEEK_CAPACITY> {
    buf: [u8; N],
    head: usize,
    tail: usize,
    count: usize,
}

impl<const N: usize> Default for PeekBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PeekBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Append a byte. Returns false (and drops nothing) when full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.head] = byte;
        self.head = (self.head + 1) % N;
        self.count += 1;
        true
    }

    /// Remove the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.tail];
        self.tail = (self.tail + 1) % N;
        self.count -= 1;
        Some(byte)
    }

    /// Look at the oldest byte without removing it.
    pub fn front(&self) -> Option<u8> {
        (!self.is_empty()).then(|| self.buf[self.tail])
    }

    /// The byte `index` places behind the oldest one.
    pub fn get(&self, index: usize) -> Option<u8> {
        (index < self.count).then(|| self.buf[(self.tail + index) % N])
    }

    /// Drop up to `n` of the oldest bytes.
    pub fn discard(&mut self, n: usize) {
        let n = n.min(self.count);
        self.tail = (self.tail + n) % N;
        self.count -= n;
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut peek: PeekBuffer = PeekBuffer::new();
        for b in b"*CL" {
            assert!(peek.push(*b));
        }
        assert_eq!(peek.len(), 3);
        assert_eq!(peek.front(), Some(b'*'));
        assert_eq!(peek.pop(), Some(b'*'));
        assert_eq!(peek.pop(), Some(b'C'));
        assert_eq!(peek.pop(), Some(b'L'));
        assert_eq!(peek.pop(), None);
    }

    #[test]
    fn test_wraps_around() {
        let mut peek = PeekBuffer::<4>::new();
        for round in 0..5u8 {
            assert!(peek.push(round));
            assert!(peek.push(round + 100));
            assert_eq!(peek.pop(), Some(round));
            assert_eq!(peek.pop(), Some(round + 100));
        }
        assert!(peek.is_empty());
    }

    #[test]
    fn test_full_rejects_push() {
        let mut peek = PeekBuffer::<2>::new();
        assert!(peek.push(1));
        assert!(peek.push(2));
        assert!(peek.is_full());
        assert!(!peek.push(3));
        assert_eq!(peek.pop(), Some(1));
        assert_eq!(peek.pop(), Some(2));
    }

    #[test]
    fn test_get_and_discard_across_wrap() {
        let mut peek = PeekBuffer::<4>::new();
        peek.push(9);
        peek.pop();
        for b in [1, 2, 3, 4] {
            peek.push(b);
        }
        assert_eq!(peek.get(0), Some(1));
        assert_eq!(peek.get(3), Some(4));
        assert_eq!(peek.get(4), None);

        peek.discard(3);
        assert_eq!(peek.len(), 1);
        assert_eq!(peek.pop(), Some(4));

        peek.push(7);
        peek.discard(5);
        assert!(peek.is_empty());
    }

    #[test]
    fn test_default_capacity_holds_markers() {
        let peek: PeekBuffer = PeekBuffer::default();
        assert!(peek.capacity() >= b"*CLOS*".len());
    }
}
