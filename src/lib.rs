//! WiFly Driver Library
//!
//! A host-side driver for WiFly RN-XV class Wi-Fi modules attached over a
//! serial line. The module is driven through its text console: settings are
//! read and written in command mode, and TCP/UDP payload flows through the
//! same line in data mode.
//!
//! # Modules
//!
//! - `port`: Transport abstraction, serial and mock implementations
//! - `protocol`: Stream matcher, read-ahead buffer, prompt tracking, option table
//! - `codec`: Argument formatting and lenient response parsing
//! - `driver`: The `WiFly` driver itself
//! - `flags`: Bit-mask and enumerated module settings
//! - `config`: Configuration management with TOML support
//! - `error`: Driver error taxonomy

pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod flags;
pub mod port;
pub mod protocol;

// Re-export commonly used types for convenience
pub use driver::{ConnectionState, ConnectionStatus, FtpSettings, ModeState, TcpState, WiFly};
pub use error::{DriverError, DriverResult};
pub use flags::{DhcpMode, IpFlags, IpProtocol, UartMode};
pub use port::{MockTransport, PortConfiguration, PortError, Transport};
pub use protocol::OptionId;

#[cfg(feature = "serial")]
pub use port::SyncSerialPort;

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult, Timing};
