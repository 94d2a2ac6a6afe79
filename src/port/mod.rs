//! Transport layer for talking to the module.
//!
//! Provides the `Transport` trait and its implementations: a real serial
//! device and a scripted mock for tests.

pub mod error;
pub mod mock;
#[cfg(feature = "serial")]
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockTransport;
#[cfg(feature = "serial")]
pub use sync_port::SyncSerialPort;
pub use traits::*;
