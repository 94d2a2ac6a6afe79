//! The driver's side of the transport.
//!
//! `Link` owns the transport together with the read-ahead buffer and the
//! optional RX capture. `read_timeout` is the single place where the driver
//! waits for input; every matcher and line reader is built on it.

use crate::port::{PortError, Transport};
use crate::protocol::{ByteSource, PeekBuffer};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Longest line kept by `read_line`; the rest of a longer line is consumed
/// and dropped.
pub const LINE_MAX: usize = 128;

/// Bounded record of received bytes for post-mortem dumps.
#[derive(Debug, Clone)]
struct RxCapture {
    bytes: Vec<u8>,
    capacity: usize,
}

pub(crate) struct Link<T> {
    port: T,
    pub(crate) peek: PeekBuffer,
    capture: Option<RxCapture>,
    trace_rx: bool,
    rx_index: u64,
    poll_interval: Duration,
}

impl<T: Transport> Link<T> {
    pub(crate) fn new(port: T, poll_interval: Duration, trace_rx: bool) -> Self {
        Self {
            port,
            peek: PeekBuffer::new(),
            capture: None,
            trace_rx,
            rx_index: 0,
            poll_interval,
        }
    }

    pub(crate) fn port(&self) -> &T {
        &self.port
    }

    pub(crate) fn port_mut(&mut self) -> &mut T {
        &mut self.port
    }

    pub(crate) fn into_port(self) -> T {
        self.port
    }

    pub(crate) fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    pub(crate) fn set_trace_rx(&mut self, on: bool) {
        self.trace_rx = on;
    }

    pub(crate) fn send(&mut self, data: &[u8]) -> Result<(), PortError> {
        debug!(data = %String::from_utf8_lossy(data).escape_debug(), "send");
        self.port.write_bytes(data)?;
        Ok(())
    }

    /// Take a byte if one is already there, without waiting.
    pub(crate) fn read_now(&mut self) -> Result<Option<u8>, PortError> {
        let byte = self.port.read_byte()?;
        if let Some(b) = byte {
            self.record(b);
        }
        Ok(byte)
    }

    pub(crate) fn port_available(&mut self) -> Result<usize, PortError> {
        self.port.bytes_available()
    }

    pub(crate) fn port_peek(&mut self) -> Result<Option<u8>, PortError> {
        self.port.peek_byte()
    }

    pub(crate) fn flush(&mut self) -> Result<(), PortError> {
        self.port.flush()
    }

    /// Wait up to `timeout` for the next byte from the transport.
    pub(crate) fn read_timeout(&mut self, timeout: Duration) -> Result<Option<u8>, PortError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(b) = self.read_now()? {
                return Ok(Some(b));
            }
            if Instant::now() >= deadline {
                trace!(?timeout, "read timed out");
                return Ok(None);
            }
            self.idle();
        }
    }

    /// Read up to CR LF. Returns `None` if the line did not end in time.
    ///
    /// A CR not followed by LF is kept as data.
    pub(crate) fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, PortError> {
        let mut line = Vec::new();
        let mut pending_cr = false;

        while let Some(ch) = self.read_timeout(timeout)? {
            if pending_cr {
                if ch == b'\n' {
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
                }
                push_bounded(&mut line, b'\r');
                pending_cr = false;
            }
            if ch == b'\r' {
                pending_cr = true;
            } else {
                push_bounded(&mut line, ch);
            }
        }

        debug!(partial = %String::from_utf8_lossy(&line).escape_debug(), "line timed out");
        Ok(None)
    }

    /// Discard input until the module has been quiet for `quiet`.
    pub(crate) fn flush_rx(&mut self, quiet: Duration) -> Result<usize, PortError> {
        let mut dropped = 0;
        while self.read_timeout(quiet)?.is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "flushed stale input");
        }
        Ok(dropped)
    }

    pub(crate) fn start_capture(&mut self, capacity: usize) {
        self.capture = Some(RxCapture {
            bytes: Vec::with_capacity(capacity),
            capacity,
        });
    }

    pub(crate) fn take_capture(&mut self) -> Option<Vec<u8>> {
        self.capture.take().map(|c| c.bytes)
    }

    pub(crate) fn idle(&self) {
        if self.poll_interval.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(self.poll_interval);
        }
    }

    fn record(&mut self, byte: u8) {
        if let Some(capture) = self.capture.as_mut() {
            if capture.bytes.len() < capture.capacity {
                capture.bytes.push(byte);
            }
        }
        if self.trace_rx {
            trace!(
                index = self.rx_index,
                byte = format_args!("{byte:02X}"),
                ch = %char::from(byte).escape_default(),
                "rx"
            );
        }
        self.rx_index = self.rx_index.wrapping_add(1);
    }
}

fn push_bounded(line: &mut Vec<u8>, byte: u8) {
    if line.len() < LINE_MAX {
        line.push(byte);
    }
}

impl<T: Transport> ByteSource for Link<T> {
    fn next_byte(&mut self, timeout: Duration) -> Result<Option<u8>, PortError> {
        self.read_timeout(timeout)
    }
}

/// Offset / hex / printable dump of captured bytes, one line per byte.
pub fn format_capture(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (ind, b) in bytes.iter().enumerate() {
        out.push_str(&format!("{ind}: {b:02X}"));
        if b.is_ascii_graphic() || *b == b' ' {
            out.push(' ');
            out.push(char::from(*b));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockTransport;

    fn link(bytes: &[u8]) -> Link<MockTransport> {
        let port = MockTransport::new("MOCK0");
        port.enqueue_read(bytes);
        Link::new(port, Duration::ZERO, false)
    }

    const T: Duration = Duration::from_millis(2);

    #[test]
    fn test_read_line() {
        let mut link = link(b"IP=1.2.3.4\r\nnext");
        assert_eq!(link.read_line(T).unwrap().as_deref(), Some("IP=1.2.3.4"));
        assert_eq!(link.read_line(T).unwrap(), None);
    }

    #[test]
    fn test_read_line_keeps_lone_cr() {
        let mut link = link(b"a\rb\r\r\n");
        assert_eq!(link.read_line(T).unwrap().as_deref(), Some("a\rb\r"));
    }

    #[test]
    fn test_read_line_truncates() {
        let mut long = vec![b'x'; LINE_MAX + 20];
        long.extend_from_slice(b"\r\nAOK");
        let mut link = link(&long);

        assert_eq!(link.read_line(T).unwrap().unwrap().len(), LINE_MAX);
        assert_eq!(link.read_timeout(T).unwrap(), Some(b'A'));
    }

    #[test]
    fn test_flush_rx() {
        let mut link = link(b"stale junk");
        assert_eq!(link.flush_rx(T).unwrap(), 10);
        assert_eq!(link.read_now().unwrap(), None);
    }

    #[test]
    fn test_capture_is_bounded() {
        let mut link = link(b"CMD\r\n");
        link.start_capture(3);
        link.flush_rx(T).unwrap();

        assert_eq!(link.take_capture().unwrap(), b"CMD");
        assert!(link.take_capture().is_none());
    }

    #[test]
    fn test_format_capture() {
        assert_eq!(format_capture(b"A\r"), "0: 41 A\n1: 0D\n");
    }
}
