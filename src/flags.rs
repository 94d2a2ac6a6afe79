//! Bit-mask and enumerated module settings.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// `set ip protocol` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct IpProtocol: u8 {
        const UDP = 0x01;
        const TCP = 0x02;
        const SECURE = 0x04;
        const TCP_CLIENT = 0x08;
        const HTTP = 0x10;
    }
}

bitflags! {
    /// `set ip flags` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct IpFlags: u8 {
        const TCP_KEEP = 0x01;
        const TCP_NODELAY = 0x02;
        const TCP_RETRY = 0x04;
        const UDP_RETRY = 0x08;
        const DNS_CACHING = 0x10;
        const ARP_CACHING = 0x20;
        const UDP_AUTO_PAIR = 0x40;
        const ADD_TIMESTAMP = 0x80;
    }
}

bitflags! {
    /// `set uart mode` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct UartMode: u8 {
        /// Console echo off. The driver always keeps this set.
        const NOECHO = 0x01;
        const DATA_TRIGGER = 0x02;
        const SLEEP_RX_BREAK = 0x08;
        const RX_BUFFER = 0x10;
    }
}

/// `set ip dhcp` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DhcpMode {
    Off = 0,
    On = 1,
    AutoIp = 2,
    Cache = 3,
    Server = 4,
}

impl DhcpMode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// True when the module obtains its address by DHCP.
    pub fn uses_dhcp(self) -> bool {
        !matches!(self, Self::Off | Self::Server)
    }

    /// Parse the word `get ip` reports after `DHCP=`.
    pub fn from_report(text: &str) -> Option<Self> {
        let word = text.trim();
        let word = word.split_whitespace().next().unwrap_or(word);
        match word.to_ascii_uppercase().as_str() {
            "OFF" => Some(Self::Off),
            "ON" => Some(Self::On),
            "AUTOIP" => Some(Self::AutoIp),
            "CACHE" => Some(Self::Cache),
            "SERVER" => Some(Self::Server),
            _ => None,
        }
    }
}

impl fmt::Display for DhcpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::On => "on",
            Self::AutoIp => "auto-ip",
            Self::Cache => "cache",
            Self::Server => "server",
        };
        f.write_str(name)
    }
}

impl FromStr for DhcpMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "off" => Ok(Self::Off),
            "1" | "on" => Ok(Self::On),
            "2" | "auto-ip" | "autoip" => Ok(Self::AutoIp),
            "3" | "cache" => Ok(Self::Cache),
            "4" | "server" => Ok(Self::Server),
            other => Err(format!("unknown DHCP mode '{other}'")),
        }
    }
}
