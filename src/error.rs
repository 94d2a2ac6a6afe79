//! Driver error taxonomy.
//!
//! Every driver operation returns `DriverResult<T>`. Timeouts and module
//! rejections are ordinary, recoverable outcomes; only `ModuleUnresponsive`
//! means the module must be rebooted before it is trusted again.

use crate::port::PortError;
use crate::protocol::literals::TIMEOUT_DIAGNOSTIC;
use thiserror::Error;

/// Convenient Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    /// An expected reply did not arrive in time.
    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: String },

    /// The module answered `ERR:`; `reason` is its text verbatim.
    #[error("module rejected command: {reason}")]
    Rejected { reason: String },

    /// `$$$` was never acknowledged and no prompt answered a bare CR.
    #[error("failed to enter command mode")]
    ModeEntry,

    /// `exit` was not acknowledged; the module is assumed still in command mode.
    #[error("failed to exit command mode")]
    ModeExit,

    /// A non-blocking open is still pending.
    #[error("a connection attempt is already in progress")]
    OpenInProgress,

    #[error("connection failed: {reason}")]
    ConnectFailed { reason: String },

    /// The module stopped answering in the middle of an open handshake.
    ///
    /// The module is expected to reset itself; reboot it before further use.
    #[error("module stopped responding during open and must be rebooted")]
    ModuleUnresponsive,

    #[error("connection did not close")]
    CloseFailed,

    #[error("failed to join network: {reason}")]
    JoinFailed { reason: String },

    #[error("host lookup failed for {host}")]
    LookupFailed { host: String },

    #[error("no ping reply from {host}")]
    PingFailed { host: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl DriverError {
    pub fn timeout(waiting_for: impl Into<String>) -> Self {
        Self::Timeout {
            waiting_for: waiting_for.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn connect_failed(reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            reason: reason.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Caller-facing diagnostic text.
    ///
    /// Rejections carry the module's own words; timeouts read `<timeout>`.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Timeout { .. } => TIMEOUT_DIAGNOSTIC.to_string(),
            Self::Rejected { reason } => reason.clone(),
            Self::ConnectFailed { reason } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// True for errors after which the module must be rebooted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModuleUnresponsive)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<DriverError> for std::io::Error {
    fn from(err: DriverError) -> Self {
        use std::io::ErrorKind;
        match err {
            DriverError::Port(PortError::Io(io)) => io,
            DriverError::Timeout { .. } => std::io::Error::new(ErrorKind::TimedOut, err),
            DriverError::InvalidArgument(_) => std::io::Error::new(ErrorKind::InvalidInput, err),
            other => std::io::Error::other(other),
        }
    }
}
