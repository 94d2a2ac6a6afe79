//! TCP connection management and the payload stream.
//!
//! While a connection is open the module forwards payload bytes verbatim and
//! signals state changes in-band with `*OPEN*` and `*CLOS*`. Reads watch for
//! a leading `*` and check whether a marker follows; bytes consumed by a
//! check that fails are parked in the peek buffer and handed out in order.

use super::WiFly;
use crate::codec::ip_to_string;
use crate::error::{DriverError, DriverResult};
use crate::port::{PortError, Transport};
use crate::protocol::find;
use crate::protocol::literals::{CLOSE, CLOSE_MARKER, OPEN_MARKER};
use serde::Serialize;
use std::io;
use std::net::Ipv4Addr;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Closed,
    /// A non-blocking open is waiting for its outcome.
    Opening,
    Open,
}

enum OpenReply {
    /// Whitespace between the prompt and the outcome.
    Noise,
    Opened,
    Failed(String),
}

impl<T: Transport> WiFly<T> {
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Open
    }

    /// Open a TCP connection to `addr:port`.
    ///
    /// An existing connection is closed first. With `block` the call waits
    /// for `*OPEN*` or a failure report; without it the call returns once
    /// the command is accepted and [`WiFly::poll_open_complete`] finishes
    /// the job.
    pub fn open(&mut self, addr: &str, port: u16, block: bool) -> DriverResult<()> {
        if self.connection == ConnectionState::Opening {
            return Err(DriverError::OpenInProgress);
        }

        self.begin_request()?;
        // Success leaves the bracket to the module (data mode on `*OPEN*`)
        // or to `poll_open_complete`.
        match self.request_open(addr, port, block) {
            Err(err) => self.finish_request(Err(err)),
            ok => ok,
        }
    }

    fn request_open(&mut self, addr: &str, port: u16, block: bool) -> DriverResult<()> {
        if self.connection == ConnectionState::Open {
            self.close()?;
        }

        info!(addr, port, "opening connection");
        self.link.send(format!("open {addr} {port}\r").as_bytes())?;

        if !self.await_prompt()? {
            error!("no prompt after open; the module is resetting");
            self.diag("WiFly has crashed and will reboot");
            self.force_data_mode();
            self.connection = ConnectionState::Closed;
            return Err(DriverError::ModuleUnresponsive);
        }

        if !block {
            self.connection = ConnectionState::Opening;
            return Ok(());
        }

        loop {
            let Some(ch) = self.link.read_timeout(self.timing.open)? else {
                warn!(addr, port, "no outcome for open");
                self.diag("Failed to open: <timeout>");
                return Err(DriverError::timeout("*OPEN*"));
            };
            match self.classify_open_reply(ch)? {
                OpenReply::Noise => continue,
                OpenReply::Opened => {
                    self.mark_open();
                    return Ok(());
                }
                OpenReply::Failed(reason) => return Err(DriverError::connect_failed(reason)),
            }
        }
    }

    pub fn open_ip(&mut self, addr: Ipv4Addr, port: u16, block: bool) -> DriverResult<()> {
        self.open(&ip_to_string(addr), port, block)
    }

    /// Resolve a pending non-blocking open.
    ///
    /// Returns `true` once the attempt is over, either way; check
    /// [`WiFly::is_connected`] for the outcome. Returns `false` while no
    /// outcome has arrived.
    pub fn poll_open_complete(&mut self) -> DriverResult<bool> {
        if self.connection != ConnectionState::Opening {
            return Ok(true);
        }

        while let Some(ch) = self.link.read_now()? {
            match self.classify_open_reply(ch)? {
                OpenReply::Noise => continue,
                OpenReply::Opened => {
                    self.mark_open();
                    return Ok(true);
                }
                OpenReply::Failed(reason) => {
                    self.connection = ConnectionState::Closed;
                    warn!(%reason, "open failed");
                    self.finish_request(Ok(()))?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn classify_open_reply(&mut self, ch: u8) -> DriverResult<OpenReply> {
        let timeout = self.timing.command;
        let reply = match ch {
            b'*' => {
                if find(&mut self.link, &OPEN_MARKER[1..], timeout)? {
                    OpenReply::Opened
                } else {
                    OpenReply::Failed("incomplete open notification".to_string())
                }
            }
            b'C' => {
                let rest = self.link.read_line(timeout)?.unwrap_or_default();
                OpenReply::Failed(format!("C{rest}"))
            }
            b'\r' | b'\n' | b' ' => OpenReply::Noise,
            other => {
                let rest = self.link.read_line(timeout)?.unwrap_or_default();
                OpenReply::Failed(format!("{}{rest}", char::from(other)))
            }
        };
        if let OpenReply::Failed(reason) = &reply {
            let message = format!("Failed to connect: {reason}");
            self.diag(&message);
        }
        Ok(reply)
    }

    fn mark_open(&mut self) {
        info!("connection open");
        self.connection = ConnectionState::Open;
        // The module drops to data mode when the connection opens.
        self.force_data_mode();
    }

    /// Close the current connection.
    ///
    /// A no-op without I/O when nothing is open. If `*CLOS*` is not seen the
    /// status register decides.
    pub fn close(&mut self) -> DriverResult<()> {
        if self.connection != ConnectionState::Open {
            return Ok(());
        }

        self.with_request(|wifly| {
            wifly.link.flush_rx(wifly.timing.flush)?;
            wifly.link.send(CLOSE)?;

            if find(&mut wifly.link, CLOSE_MARKER, wifly.timing.command)? {
                info!("connection closed");
                wifly.connection = ConnectionState::Closed;
                return Ok(());
            }

            warn!("no close notification; checking status");
            let status = wifly.poll_status()?;
            if status.is_connected() {
                wifly.diag("Failed to close");
                Err(DriverError::CloseFailed)
            } else {
                wifly.connection = ConnectionState::Closed;
                Ok(())
            }
        })
    }

    /// The marker a leading `*` could start in the current state.
    fn watched_marker(&self) -> Option<&'static [u8]> {
        match self.connection {
            ConnectionState::Open => Some(CLOSE_MARKER),
            ConnectionState::Closed if self.mode == super::ModeState::Data => Some(OPEN_MARKER),
            _ => None,
        }
    }

    /// Check whether `pattern` is arriving.
    ///
    /// Bytes already parked in the peek buffer are compared first, then
    /// fresh bytes are read and parked behind them. With `sentinel_consumed`
    /// the caller already took the leading `*`. On a full match the marker
    /// bytes are dropped and the connection state updated; on a mismatch or
    /// timeout everything stays queued for the reader.
    fn check_state_change(&mut self, pattern: &[u8], sentinel_consumed: bool) -> DriverResult<bool> {
        let rest = &pattern[usize::from(sentinel_consumed)..];
        for (index, &expected) in rest.iter().enumerate() {
            let b = match self.link.peek.get(index) {
                Some(b) => b,
                None => {
                    let Some(b) = self.link.read_timeout(self.timing.notification)? else {
                        return Ok(false);
                    };
                    if !self.link.peek.push(b) {
                        return Err(PortError::fault("read-ahead buffer overflow").into());
                    }
                    b
                }
            };
            if b != expected {
                return Ok(false);
            }
        }

        self.link.peek.discard(rest.len());
        if pattern == CLOSE_MARKER {
            info!("connection closed by peer");
            self.connection = ConnectionState::Closed;
            self.diag("Closed");
        } else {
            info!("connection opened by peer");
            self.connection = ConnectionState::Open;
        }
        Ok(true)
    }

    /// Next payload byte, or `None` if nothing is waiting.
    ///
    /// Also `None` on the call that consumed a state-change marker. Every
    /// `*`, fresh or parked, is checked against the watched marker.
    pub fn read_byte(&mut self) -> DriverResult<Option<u8>> {
        let b = match self.link.peek.pop() {
            Some(b) => b,
            None => match self.link.read_now()? {
                Some(b) => b,
                None => return Ok(None),
            },
        };
        if b == b'*' {
            if let Some(marker) = self.watched_marker() {
                if self.check_state_change(marker, true)? {
                    return Ok(None);
                }
            }
        }
        Ok(Some(b))
    }

    /// Payload bytes ready to read.
    pub fn available(&mut self) -> DriverResult<usize> {
        let next = match self.link.peek.front() {
            Some(b) => Some(b),
            None if self.link.port_available()? > 0 => self.link.port_peek()?,
            None => None,
        };
        if next == Some(b'*') {
            if let Some(marker) = self.watched_marker() {
                if self.link.peek.is_empty() {
                    if let Some(b) = self.link.read_now()? {
                        self.link.peek.push(b);
                    }
                }
                self.check_state_change(marker, false)?;
            }
        }
        Ok(self.link.peek.len() + self.link.port_available()?)
    }

    /// Next payload byte without consuming it.
    pub fn peek(&mut self) -> DriverResult<Option<u8>> {
        if self.available()? == 0 {
            return Ok(None);
        }
        match self.link.peek.front() {
            Some(b) => Ok(Some(b)),
            None => Ok(self.link.port_peek()?),
        }
    }

    /// Send payload bytes.
    pub fn write(&mut self, data: &[u8]) -> DriverResult<usize> {
        self.link.send(data)?;
        Ok(data.len())
    }

    pub fn flush(&mut self) -> DriverResult<()> {
        Ok(self.link.flush()?)
    }

    /// Drop any payload still buffered on either side.
    pub fn discard_input(&mut self) -> DriverResult<usize> {
        let parked = self.link.peek.len();
        self.link.peek.clear();
        let dropped = self.link.flush_rx(self.timing.flush)?;
        debug!(parked, dropped, "discarded input");
        Ok(parked + dropped)
    }
}

impl<T: Transport> io::Read for WiFly<T> {
    /// Reads what is ready. `WouldBlock` while the connection is open but
    /// idle; `Ok(0)` once it is closed.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_byte()? {
                Some(b) => {
                    buf[filled] = b;
                    filled += 1;
                }
                None => break,
            }
        }
        if filled == 0 && self.connection == ConnectionState::Open {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        Ok(filled)
    }
}

impl<T: Transport> io::Write for WiFly<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(WiFly::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(WiFly::flush(self)?)
    }
}
