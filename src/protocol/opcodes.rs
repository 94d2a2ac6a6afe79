//! Read-option request table.
//!
//! Each readable setting is fetched by sending a request line and scanning
//! for a response prefix; the value runs from the prefix to the end of line.
//! Several options share one request (`get ip` reports six of them).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A request line and the prefix that introduces the wanted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionRequest {
    pub request: &'static str,
    pub response: &'static str,
}

const GET_IP: &str = "get ip\r";
const GET_UART: &str = "get u\r";
const GET_COMM: &str = "get comm\r";
const SHOW_TIME: &str = "show time\r";

/// Readable module options. The discriminant indexes [`OPTION_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionId {
    Ip = 0,
    Netmask = 1,
    Gateway = 2,
    Mac = 3,
    Ssid = 4,
    DeviceId = 5,
    Baud = 6,
    Time = 7,
    Uptime = 8,
    Zone = 9,
    Dns = 10,
    Rtc = 11,
    Dhcp = 12,
    UartMode = 13,
    FlushTimeout = 14,
    FlushChar = 15,
    FlushSize = 16,
    Rssi = 17,
    IpFlags = 18,
    Host = 19,
}

pub static OPTION_TABLE: [OptionRequest; 20] = [
    OptionRequest { request: GET_IP, response: "IP=" },
    OptionRequest { request: GET_IP, response: "NM=" },
    OptionRequest { request: GET_IP, response: "GW=" },
    OptionRequest { request: "get mac\r", response: "Mac Addr=" },
    OptionRequest { request: "get wlan\r", response: "SSID=" },
    OptionRequest { request: "get opt\r", response: "DeviceId=" },
    OptionRequest { request: GET_UART, response: "Baudrate=" },
    OptionRequest { request: SHOW_TIME, response: "Time=" },
    OptionRequest { request: SHOW_TIME, response: "UpTime=" },
    OptionRequest { request: "get time\r", response: "Zone=" },
    OptionRequest { request: "get dns\r", response: "Address=" },
    OptionRequest { request: "show t t\r", response: "RTC=" },
    OptionRequest { request: GET_IP, response: "DHCP=" },
    OptionRequest { request: GET_UART, response: "Mode=" },
    OptionRequest { request: GET_COMM, response: "FlushTimer=" },
    OptionRequest { request: GET_COMM, response: "MatchChar=" },
    OptionRequest { request: GET_COMM, response: "FlushSize=" },
    OptionRequest { request: "show rssi\r", response: "RSSI=(-" },
    OptionRequest { request: GET_IP, response: "FLAGS=0x" },
    OptionRequest { request: GET_IP, response: "HOST=" },
];

impl OptionId {
    pub const ALL: [OptionId; 20] = [
        Self::Ip,
        Self::Netmask,
        Self::Gateway,
        Self::Mac,
        Self::Ssid,
        Self::DeviceId,
        Self::Baud,
        Self::Time,
        Self::Uptime,
        Self::Zone,
        Self::Dns,
        Self::Rtc,
        Self::Dhcp,
        Self::UartMode,
        Self::FlushTimeout,
        Self::FlushChar,
        Self::FlushSize,
        Self::Rssi,
        Self::IpFlags,
        Self::Host,
    ];

    pub fn entry(self) -> &'static OptionRequest {
        &OPTION_TABLE[self as usize]
    }

    pub fn request(self) -> &'static str {
        self.entry().request
    }

    pub fn response(self) -> &'static str {
        self.entry().response
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ip => "ip",
            Self::Netmask => "netmask",
            Self::Gateway => "gateway",
            Self::Mac => "mac",
            Self::Ssid => "ssid",
            Self::DeviceId => "device-id",
            Self::Baud => "baud",
            Self::Time => "time",
            Self::Uptime => "uptime",
            Self::Zone => "zone",
            Self::Dns => "dns",
            Self::Rtc => "rtc",
            Self::Dhcp => "dhcp",
            Self::UartMode => "uart-mode",
            Self::FlushTimeout => "flush-timeout",
            Self::FlushChar => "flush-char",
            Self::FlushSize => "flush-size",
            Self::Rssi => "rssi",
            Self::IpFlags => "ip-flags",
            Self::Host => "host",
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown option '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_discriminants() {
        for (ind, id) in OptionId::ALL.iter().enumerate() {
            assert_eq!(*id as usize, ind);
        }
    }

    #[test]
    fn test_requests_are_cr_terminated() {
        for entry in OPTION_TABLE.iter() {
            assert!(entry.request.ends_with('\r'), "{entry:?}");
            assert!(!entry.response.is_empty());
        }
    }

    #[test]
    fn test_known_entries() {
        assert_eq!(OptionId::Mac.request(), "get mac\r");
        assert_eq!(OptionId::Mac.response(), "Mac Addr=");
        assert_eq!(OptionId::Ssid.response(), "SSID=");
        assert_eq!(OptionId::Rssi.response(), "RSSI=(-");
        assert_eq!(OptionId::Host.request(), "get ip\r");
    }

    #[test]
    fn test_name_round_trip() {
        for id in OptionId::ALL {
            assert_eq!(id.name().parse::<OptionId>().unwrap(), id);
        }
        assert!("bogus".parse::<OptionId>().is_err());
    }
}
