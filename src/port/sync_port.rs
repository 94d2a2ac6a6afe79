//! Synchronous serial port transport.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own `Transport`
//! trait. Serial devices cannot peek, so a one-byte look-ahead slot is kept
//! here.

use super::error::PortError;
use super::traits::{PortConfiguration, Transport};
use std::io::{Read, Write};

/// Serial device transport wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
    /// Byte taken off the device by `peek_byte` but not yet read.
    lookahead: Option<u8>,
}

impl SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// # Example
    /// ```no_run
    /// use wifly_driver::port::{PortConfiguration, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", PortConfiguration::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
            lookahead: None,
        })
    }

    /// Open a serial port at the module's factory 9600 8N1 settings.
    pub fn open_default(port_name: &str) -> Result<Self, PortError> {
        Self::open(port_name, PortConfiguration::default())
    }

    /// Change the host side baud rate, e.g. after `set_baud` on the module.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), PortError> {
        self.port.set_baud_rate(baud_rate).map_err(PortError::Serial)
    }

    fn pending(&self) -> Result<usize, PortError> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(PortError::Serial)
    }

    fn take_from_device(&mut self) -> Result<Option<u8>, PortError> {
        if self.pending()? == 0 {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(PortError::Io(e)),
        }
    }
}

impl Transport for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write_all(data).map_err(PortError::Io)?;
        Ok(data.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        if let Some(byte) = self.lookahead.take() {
            return Ok(Some(byte));
        }
        self.take_from_device()
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, PortError> {
        if self.lookahead.is_none() {
            self.lookahead = self.take_from_device()?;
        }
        Ok(self.lookahead)
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        Ok(self.pending()? + usize::from(self.lookahead.is_some()))
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.port.flush().map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .field("lookahead", &self.lookahead)
            .finish()
    }
}
