//! Port-specific error types.
//!
//! Defines error types for transport operations, separate from driver-level
//! errors so the protocol engine can wrap them without caring which transport
//! produced them.

use thiserror::Error;

/// Errors that can occur while moving bytes to or from the module.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A scripted or simulated transport was told to fail.
    #[error("Transport fault: {0}")]
    Fault(String),

    /// A serialport-specific error occurred.
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Fault error from a message.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyUSB0");

        let err = PortError::config("Invalid baud rate");
        assert_eq!(err.to_string(), "Configuration error: Invalid baud rate");

        let err = PortError::fault("unplugged");
        assert_eq!(err.to_string(), "Transport fault: unplugged");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: PortError = io.into();
        assert!(matches!(err, PortError::Io(_)));
    }
}
