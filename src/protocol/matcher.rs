//! Streaming pattern matcher over an unbuffered byte stream.
//!
//! The console cannot be read as whole responses: bytes trickle in and the
//! interesting token may be preceded by any amount of chatter. The matcher
//! consumes one byte at a time and keeps a cursor per pattern.
//!
//! Restart policy: on a mismatch the cursor drops to zero and the *same* byte
//! is compared against the first pattern byte again, so a token that starts
//! right where a partial match failed is not missed.

use crate::port::PortError;
use std::time::Duration;

/// A source of bytes that can wait a bounded time for the next one.
///
/// This is the only blocking primitive the protocol layer uses.
pub trait ByteSource {
    /// Return the next byte, or `None` if nothing arrived within `timeout`.
    fn next_byte(&mut self, timeout: Duration) -> Result<Option<u8>, PortError>;
}

/// Cursor state for one pattern.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    pos: usize,
}

impl Cursor {
    /// Feed one byte; returns true once the whole pattern has been seen.
    fn feed(&mut self, pattern: &[u8], byte: u8) -> bool {
        if byte == pattern[self.pos] {
            self.pos += 1;
        } else {
            self.pos = usize::from(byte == pattern[0]);
        }
        self.pos == pattern.len()
    }
}

/// Scan for `pattern`, waiting at most `timeout` for each byte.
///
/// An empty pattern matches immediately without consuming anything.
pub fn find<S: ByteSource + ?Sized>(
    source: &mut S,
    pattern: &[u8],
    timeout: Duration,
) -> Result<bool, PortError> {
    if pattern.is_empty() {
        return Ok(true);
    }

    let mut cursor = Cursor::default();
    while let Some(byte) = source.next_byte(timeout)? {
        if cursor.feed(pattern, byte) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Scan for whichever of `patterns` completes first.
///
/// Returns the index of the winning pattern, or `None` on timeout. When two
/// patterns complete on the same byte the lower index wins. An empty pattern
/// wins immediately.
pub fn find_any<S: ByteSource + ?Sized>(
    source: &mut S,
    patterns: &[&[u8]],
    timeout: Duration,
) -> Result<Option<usize>, PortError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    if let Some(ind) = patterns.iter().position(|p| p.is_empty()) {
        return Ok(Some(ind));
    }

    let mut cursors = vec![Cursor::default(); patterns.len()];
    while let Some(byte) = source.next_byte(timeout)? {
        let mut winner = None;
        for (ind, (cursor, pattern)) in cursors.iter_mut().zip(patterns).enumerate() {
            if cursor.feed(pattern, byte) && winner.is_none() {
                winner = Some(ind);
            }
        }
        if winner.is_some() {
            return Ok(winner);
        }
    }
    Ok(None)
}

/// In-memory byte source; every `next_byte` either yields or times out at once.
#[derive(Debug, Clone, Default)]
pub struct SliceSource {
    bytes: std::collections::VecDeque<u8>,
}

impl SliceSource {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.iter().copied().collect(),
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> Vec<u8> {
        self.bytes.iter().copied().collect()
    }
}

impl ByteSource for SliceSource {
    fn next_byte(&mut self, _timeout: Duration) -> Result<Option<u8>, PortError> {
        Ok(self.bytes.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(1);

    #[test]
    fn test_find_in_chatter() {
        let mut src = SliceSource::new(b"junk\r\nAOK\r\n<4.00> ");
        assert!(find(&mut src, b"AOK\r\n", T).unwrap());
        assert_eq!(src.remaining(), b"<4.00> ");
    }

    #[test]
    fn test_empty_pattern_consumes_nothing() {
        let mut src = SliceSource::new(b"abc");
        assert!(find(&mut src, b"", T).unwrap());
        assert_eq!(src.remaining(), b"abc");
    }

    #[test]
    fn test_timeout_returns_false() {
        let mut src = SliceSource::new(b"CM");
        assert!(!find(&mut src, b"CMD\r\n", T).unwrap());
        assert!(src.remaining().is_empty());
    }

    #[test]
    fn test_restart_rechecks_failing_byte() {
        // The 'C' that breaks "CC" is itself the start of "CMD".
        let mut src = SliceSource::new(b"CCMD\r\n");
        assert!(find(&mut src, b"CMD\r\n", T).unwrap());
    }

    #[test]
    fn test_single_byte_lookback_limit() {
        // Only one byte of restart lookback: "aab" inside "aaab" is missed.
        let mut src = SliceSource::new(b"aaab");
        assert!(!find(&mut src, b"aab", T).unwrap());

        let mut src = SliceSource::new(b"abaabx");
        assert!(find(&mut src, b"aab", T).unwrap());
    }

    #[test]
    fn test_find_any_picks_first_complete() {
        let patterns: [&[u8]; 2] = [b"ERR: ", b"AOK\r\n"];

        let mut src = SliceSource::new(b"\r\nAOK\r\n");
        assert_eq!(find_any(&mut src, &patterns, T).unwrap(), Some(1));

        let mut src = SliceSource::new(b"ERR: Busy\r\n");
        assert_eq!(find_any(&mut src, &patterns, T).unwrap(), Some(0));
        assert_eq!(src.remaining(), b"Busy\r\n");

        let mut src = SliceSource::new(b"nothing useful");
        assert_eq!(find_any(&mut src, &patterns, T).unwrap(), None);
    }

    #[test]
    fn test_find_any_tie_goes_to_lower_index() {
        let patterns: [&[u8]; 2] = [b"OPEN*", b"*"];
        let mut src = SliceSource::new(b"x*");
        assert_eq!(find_any(&mut src, &patterns, T).unwrap(), Some(1));

        let patterns: [&[u8]; 2] = [b"N*", b"*"];
        let mut src = SliceSource::new(b"N*");
        assert_eq!(find_any(&mut src, &patterns, T).unwrap(), Some(0));
    }
}
