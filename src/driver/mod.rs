//! The WiFly driver.
//!
//! [`WiFly`] owns a [`Transport`] and layers the module's console protocol on
//! top of it: command-mode entry and exit with nesting, option requests,
//! TCP connection management with in-band `*OPEN*`/`*CLOS*` detection, and
//! the higher level network, lifecycle and FTP helpers.
//!
//! Everything is synchronous. Each wait is bounded by one of the budgets in
//! [`Timing`]; no operation can block forever.
//!
//! # Example
//!
//! ```rust,ignore
//! use wifly_driver::{Config, SyncSerialPort, WiFly};
//!
//! let config = Config::default();
//! let port = SyncSerialPort::open("/dev/ttyUSB0", config.serial.port_configuration())?;
//! let mut wifly = WiFly::new(port, &config);
//! wifly.begin()?;
//! wifly.join(Some("HomeNet"))?;
//! wifly.open("example.com", 80, true)?;
//! wifly.write_all(b"GET / HTTP/1.0\r\n\r\n")?;
//! ```

mod connection;
mod ftp;
mod lifecycle;
mod link;
mod mode;
mod network;
mod options;
mod request;
mod status;

pub use connection::ConnectionState;
pub use ftp::FtpSettings;
pub use link::{format_capture, LINE_MAX};
pub use mode::ModeState;
pub use options::MAX_FLUSH_SIZE;
pub use status::{ConnectionStatus, TcpState};

use crate::config::{Config, ModuleConfig, Timing};
use crate::error::DriverResult;
use crate::port::Transport;
use crate::protocol::PromptTracker;
use link::Link;
use std::fmt;
use std::io::Write;
use std::time::Duration;

/// Optional sink for human-readable diagnostics.
pub type DebugSink = Box<dyn Write + Send>;

pub struct WiFly<T: Transport> {
    link: Link<T>,
    prompt: PromptTracker,
    mode: ModeState,
    depth: u32,
    /// Command mode was entered explicitly and stays until an explicit exit.
    pinned: bool,
    connection: ConnectionState,
    status: ConnectionStatus,
    dhcp: bool,
    timing: Timing,
    module: ModuleConfig,
    debug: Option<DebugSink>,
}

impl<T: Transport> WiFly<T> {
    /// Wrap `port` using the timing and module settings from `config`.
    ///
    /// No bytes are exchanged until the first operation; call
    /// [`WiFly::begin`] to run the startup sequence.
    pub fn new(port: T, config: &Config) -> Self {
        Self::with_settings(port, config.timing_runtime(), config.module.clone())
    }

    /// Wrap `port` with explicit timing and default module settings.
    pub fn with_timing(port: T, timing: Timing) -> Self {
        Self::with_settings(port, timing, ModuleConfig::default())
    }

    pub fn with_settings(port: T, timing: Timing, module: ModuleConfig) -> Self {
        Self {
            link: Link::new(port, timing.poll_interval, module.trace_rx),
            prompt: PromptTracker::new(),
            mode: ModeState::Data,
            depth: 0,
            pinned: false,
            connection: ConnectionState::Closed,
            status: ConnectionStatus::default(),
            dhcp: true,
            timing,
            module,
            debug: None,
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.link.set_poll_interval(timing.poll_interval);
        self.timing = timing;
    }

    pub fn module_settings(&self) -> &ModuleConfig {
        &self.module
    }

    pub fn transport(&self) -> &T {
        self.link.port()
    }

    /// Direct access to the transport, e.g. to follow a baud change.
    pub fn transport_mut(&mut self) -> &mut T {
        self.link.port_mut()
    }

    pub fn into_transport(self) -> T {
        self.link.into_port()
    }

    /// The learned console prompt, if any.
    pub fn prompt(&self) -> Option<String> {
        self.prompt.text()
    }

    /// Drop the learned prompt; the next command relearns it.
    pub fn forget_prompt(&mut self) {
        self.prompt.forget();
    }

    /// Send diagnostics (rejections, timeouts, crashes) to `sink`.
    pub fn set_debug_sink(&mut self, sink: DebugSink) {
        self.debug = Some(sink);
    }

    pub fn clear_debug_sink(&mut self) -> Option<DebugSink> {
        self.debug.take()
    }

    /// Log every received byte at trace level.
    pub fn set_trace_rx(&mut self, on: bool) {
        self.module.trace_rx = on;
        self.link.set_trace_rx(on);
    }

    /// Start recording up to `capacity` received bytes.
    pub fn start_rx_capture(&mut self, capacity: usize) {
        self.link.start_capture(capacity);
    }

    /// Stop recording and return what was captured.
    pub fn take_rx_capture(&mut self) -> Option<Vec<u8>> {
        self.link.take_capture()
    }

    /// Stop recording and write a hex dump of the capture to the debug sink.
    pub fn dump_rx_capture(&mut self) {
        if let Some(bytes) = self.link.take_capture() {
            let dump = format_capture(&bytes);
            self.diag(dump.trim_end());
        }
    }

    fn diag(&mut self, message: &str) {
        if let Some(sink) = self.debug.as_mut() {
            // Sink errors are ignored.
            let _ = writeln!(sink, "{message}");
        }
    }

    fn await_prompt(&mut self) -> DriverResult<bool> {
        Ok(self.prompt.await_prompt(&mut self.link, self.timing.command)?)
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<T: Transport> fmt::Debug for WiFly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiFly")
            .field("transport", &self.link.port().name())
            .field("mode", &self.mode)
            .field("depth", &self.depth)
            .field("pinned", &self.pinned)
            .field("connection", &self.connection)
            .field("prompt", &self.prompt.text())
            .field("dhcp", &self.dhcp)
            .finish_non_exhaustive()
    }
}
