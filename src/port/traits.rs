//! Core traits for the module transport.
//!
//! Defines the `Transport` trait that lets a real serial port and the scripted
//! mock be used interchangeably underneath the driver.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration parameters for the serial link to the module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Timeout of a single OS-level read.
    ///
    /// The driver never relies on this for protocol timing; it polls
    /// `bytes_available` against its own deadlines.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        // RN-XV modules ship at 9600 8N1.
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_millis(10),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

#[cfg(feature = "serial")]
impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

#[cfg(feature = "serial")]
impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[cfg(feature = "serial")]
impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

#[cfg(feature = "serial")]
impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Byte-oriented duplex link to the module.
///
/// Every method is non-blocking from the driver's point of view: reads return
/// `None` when nothing has arrived yet, and all waiting is done by the driver
/// against its own deadlines.
pub trait Transport: std::fmt::Debug {
    /// Write bytes to the module.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Take the next received byte, if one is available.
    fn read_byte(&mut self) -> Result<Option<u8>, PortError>;

    /// Look at the next received byte without consuming it.
    fn peek_byte(&mut self) -> Result<Option<u8>, PortError>;

    /// Number of received bytes ready to be read.
    fn bytes_available(&mut self) -> Result<usize, PortError>;

    /// Push any buffered outgoing bytes onto the wire.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this transport.
    fn name(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write_bytes(data)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        (**self).read_byte()
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, PortError> {
        (**self).peek_byte()
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        (**self).bytes_available()
    }

    fn flush(&mut self) -> Result<(), PortError> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
