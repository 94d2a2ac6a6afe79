//! Connection status register (`show c`).

use super::WiFly;
use crate::codec::parse_hex;
use crate::error::{DriverError, DriverResult};
use crate::port::Transport;
use crate::protocol::literals::SHOW_CONNECTION;
use serde::Serialize;
use tracing::debug;

const TCP_MASK: u16 = 0x000F;
const ASSOCIATED_BIT: u16 = 1 << 4;
const AUTHENTICATED_BIT: u16 = 1 << 5;
const DNS_SERVER_BIT: u16 = 1 << 6;
const DNS_FOUND_BIT: u16 = 1 << 7;
const CHANNEL_SHIFT: u16 = 9;
const CHANNEL_MASK: u16 = 0x0F;

/// TCP field of the status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TcpState {
    #[default]
    Idle,
    Connected,
    NoIp,
    Connecting,
    Other(u8),
}

impl From<u8> for TcpState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Connected,
            3 => Self::NoIp,
            4 => Self::Connecting,
            other => Self::Other(other),
        }
    }
}

/// Decoded status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionStatus {
    pub raw: u16,
    pub tcp: TcpState,
    pub associated: bool,
    pub authenticated: bool,
    pub dns_server_contacted: bool,
    pub dns_found: bool,
    pub channel: u8,
}

impl ConnectionStatus {
    pub fn from_register(raw: u16) -> Self {
        Self {
            raw,
            tcp: TcpState::from((raw & TCP_MASK) as u8),
            associated: raw & ASSOCIATED_BIT != 0,
            authenticated: raw & AUTHENTICATED_BIT != 0,
            dns_server_contacted: raw & DNS_SERVER_BIT != 0,
            dns_found: raw & DNS_FOUND_BIT != 0,
            channel: ((raw >> CHANNEL_SHIFT) & CHANNEL_MASK) as u8,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.tcp == TcpState::Connected
    }
}

/// The register is the last four hex digits of the line.
fn register_digits(line: &str) -> &str {
    let line = line.trim();
    let start = line.len().saturating_sub(4);
    line.get(start..).unwrap_or(line)
}

impl<T: Transport> WiFly<T> {
    /// Query and decode the status register.
    pub fn poll_status(&mut self) -> DriverResult<ConnectionStatus> {
        self.with_request(|wifly| {
            wifly.link.send(SHOW_CONNECTION)?;

            let timeout = wifly.timing.command;
            let mut line = wifly
                .link
                .read_line(timeout)?
                .ok_or_else(|| DriverError::timeout("connection status"))?;
            if wifly.prompt.appears_in(line.as_bytes()) {
                // A stale prompt preceded the register.
                line = wifly
                    .link
                    .read_line(timeout)?
                    .ok_or_else(|| DriverError::timeout("connection status"))?;
            } else {
                wifly.await_prompt()?;
            }

            let status = ConnectionStatus::from_register(parse_hex(register_digits(&line)) as u16);
            debug!(raw = format_args!("{:04x}", status.raw), ?status.tcp, "connection status");
            wifly.status = status;
            Ok(status)
        })
    }

    /// Status from the last `poll_status`.
    pub fn last_status(&self) -> ConnectionStatus {
        self.status
    }
}
