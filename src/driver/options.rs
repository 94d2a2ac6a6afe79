//! Typed getters and setters over `get_option` / `set_option`.

use super::WiFly;
use crate::codec::{ip_to_string, parse_dec, parse_hex, parse_ip, to_dec_arg, to_hex_arg};
use crate::error::{DriverError, DriverResult};
use crate::flags::{DhcpMode, IpFlags, IpProtocol, UartMode};
use crate::port::Transport;
use crate::protocol::OptionId;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// Largest flush size the module accepts.
pub const MAX_FLUSH_SIZE: u16 = 1460;

/// Highest `set ip dhcp` code the firmware accepts.
const MAX_DHCP_CODE: u8 = 9;

/// Split `ip:port` as reported by `HOST=`.
fn split_host(value: &str) -> (Ipv4Addr, u16) {
    let (ip, port) = value.split_once(':').unwrap_or((value, ""));
    (parse_ip(ip), parse_dec(port) as u16)
}

impl<T: Transport> WiFly<T> {
    // --- getters ---

    pub fn ssid(&mut self) -> DriverResult<String> {
        self.get_option(OptionId::Ssid)
    }

    pub fn device_id(&mut self) -> DriverResult<String> {
        self.get_option(OptionId::DeviceId)
    }

    pub fn ip(&mut self) -> DriverResult<Ipv4Addr> {
        Ok(parse_ip(&self.get_option(OptionId::Ip)?))
    }

    pub fn netmask(&mut self) -> DriverResult<Ipv4Addr> {
        Ok(parse_ip(&self.get_option(OptionId::Netmask)?))
    }

    pub fn gateway(&mut self) -> DriverResult<Ipv4Addr> {
        Ok(parse_ip(&self.get_option(OptionId::Gateway)?))
    }

    pub fn dns(&mut self) -> DriverResult<Ipv4Addr> {
        Ok(parse_ip(&self.get_option(OptionId::Dns)?))
    }

    pub fn mac(&mut self) -> DriverResult<String> {
        self.get_option(OptionId::Mac)
    }

    pub fn dhcp_mode(&mut self) -> DriverResult<DhcpMode> {
        let value = self.get_option(OptionId::Dhcp)?;
        DhcpMode::from_report(&value)
            .ok_or_else(|| DriverError::UnexpectedResponse(format!("DHCP={value}")))
    }

    /// Signal strength in dBm.
    pub fn rssi(&mut self) -> DriverResult<i32> {
        let value = self.get_option(OptionId::Rssi)?;
        Ok(-(parse_dec(&value) as i32))
    }

    pub fn baud(&mut self) -> DriverResult<u32> {
        Ok(parse_dec(&self.get_option(OptionId::Baud)?))
    }

    pub fn uart_mode(&mut self) -> DriverResult<UartMode> {
        let value = self.get_option(OptionId::UartMode)?;
        Ok(UartMode::from_bits_retain(parse_hex(&value) as u8))
    }

    pub fn ip_flags(&mut self) -> DriverResult<IpFlags> {
        let value = self.get_option(OptionId::IpFlags)?;
        Ok(IpFlags::from_bits_retain(parse_hex(&value) as u8))
    }

    /// Flush timeout in milliseconds.
    pub fn flush_timeout(&mut self) -> DriverResult<u32> {
        Ok(parse_dec(&self.get_option(OptionId::FlushTimeout)?))
    }

    pub fn flush_char(&mut self) -> DriverResult<u8> {
        Ok(parse_hex(&self.get_option(OptionId::FlushChar)?) as u8)
    }

    pub fn flush_size(&mut self) -> DriverResult<u16> {
        Ok(parse_dec(&self.get_option(OptionId::FlushSize)?) as u16)
    }

    /// Remote host address and port.
    pub fn host(&mut self) -> DriverResult<(Ipv4Addr, u16)> {
        Ok(split_host(&self.get_option(OptionId::Host)?))
    }

    pub fn host_ip(&mut self) -> DriverResult<Ipv4Addr> {
        Ok(self.host()?.0)
    }

    pub fn host_port(&mut self) -> DriverResult<u16> {
        Ok(self.host()?.1)
    }

    pub fn time(&mut self) -> DriverResult<String> {
        self.get_option(OptionId::Time)
    }

    /// Seconds since boot.
    pub fn uptime(&mut self) -> DriverResult<u32> {
        Ok(parse_dec(&self.get_option(OptionId::Uptime)?))
    }

    pub fn timezone(&mut self) -> DriverResult<u8> {
        Ok(parse_dec(&self.get_option(OptionId::Zone)?) as u8)
    }

    /// Real-time clock, seconds since the epoch.
    pub fn rtc(&mut self) -> DriverResult<u32> {
        Ok(parse_dec(&self.get_option(OptionId::Rtc)?))
    }

    // --- setters ---

    pub fn set_device_id(&mut self, id: &str) -> DriverResult<()> {
        self.set_value("set opt deviceid", id)
    }

    pub fn set_ip(&mut self, addr: Ipv4Addr) -> DriverResult<()> {
        self.set_value("set ip address", ip_to_string(addr))
    }

    pub fn set_netmask(&mut self, mask: Ipv4Addr) -> DriverResult<()> {
        self.set_value("set ip netmask", ip_to_string(mask))
    }

    pub fn set_gateway(&mut self, addr: Ipv4Addr) -> DriverResult<()> {
        self.set_value("set ip gateway", ip_to_string(addr))
    }

    pub fn set_dns(&mut self, addr: Ipv4Addr) -> DriverResult<()> {
        self.set_value("set dns address", ip_to_string(addr))
    }

    pub fn set_ssid(&mut self, ssid: &str) -> DriverResult<()> {
        self.set_value("set wlan ssid", ssid)
    }

    /// Channel 0 lets the module scan.
    pub fn set_channel(&mut self, channel: u8) -> DriverResult<()> {
        if channel > 13 {
            return Err(DriverError::invalid(format!("channel {channel} out of range")));
        }
        self.set_value("set wlan chan", to_dec_arg(channel.into()))
    }

    /// Set the WEP key and hide it from `get wlan`.
    pub fn set_key(&mut self, key: &str) -> DriverResult<()> {
        self.set_value("set wlan key", key)?;
        self.hide_credentials();
        Ok(())
    }

    /// Set the WPA passphrase and hide it from `get wlan`.
    pub fn set_passphrase(&mut self, passphrase: &str) -> DriverResult<()> {
        self.set_value("set wlan phrase", passphrase)?;
        self.hide_credentials();
        Ok(())
    }

    fn hide_credentials(&mut self) {
        if let Err(err) = self.set_value("set wlan hide", "1") {
            warn!(%err, "could not hide credentials");
        }
    }

    /// Change the character the module turns back into a space, here and on
    /// the module.
    pub fn set_space_replacement(&mut self, replacement: char) -> DriverResult<()> {
        if replacement == ' ' || !replacement.is_ascii_graphic() {
            return Err(DriverError::invalid(format!(
                "{replacement:?} cannot stand in for a space"
            )));
        }
        self.set_value("set opt replace", to_hex_arg(u32::from(replacement)))?;
        self.module.space_replacement = replacement;
        Ok(())
    }

    pub fn set_dhcp(&mut self, mode: DhcpMode) -> DriverResult<()> {
        self.set_dhcp_code(mode.code())?;
        self.dhcp = mode.uses_dhcp();
        Ok(())
    }

    /// Raw `set ip dhcp` code, including firmware-specific values above 4.
    pub fn set_dhcp_code(&mut self, code: u8) -> DriverResult<()> {
        if code > MAX_DHCP_CODE {
            return Err(DriverError::invalid(format!("DHCP mode {code}")));
        }
        self.set_value("set ip dhcp", to_dec_arg(code.into()))
    }

    pub fn enable_dhcp(&mut self) -> DriverResult<()> {
        self.set_dhcp(DhcpMode::On)
    }

    pub fn disable_dhcp(&mut self) -> DriverResult<()> {
        self.set_dhcp(DhcpMode::Off)
    }

    pub fn set_host_ip(&mut self, host: &str) -> DriverResult<()> {
        self.set_value("set ip host", host)
    }

    pub fn set_host_port(&mut self, port: u16) -> DriverResult<()> {
        self.set_value("set ip remote", to_dec_arg(port.into()))
    }

    /// Set remote address and port in one command-mode session.
    pub fn set_host(&mut self, host: &str, port: u16) -> DriverResult<()> {
        self.with_request(|wifly| {
            wifly.set_host_ip(host)?;
            wifly.set_host_port(port)
        })
    }

    pub fn set_ip_protocol(&mut self, protocol: IpProtocol) -> DriverResult<()> {
        self.set_value("set ip protocol", to_hex_arg(protocol.bits().into()))
    }

    pub fn set_ip_flags(&mut self, flags: IpFlags) -> DriverResult<()> {
        self.set_value("set ip flags", to_hex_arg(flags.bits().into()))
    }

    /// Echo stays off whatever `mode` says; the driver cannot parse echoed
    /// commands.
    pub fn set_uart_mode(&mut self, mode: UartMode) -> DriverResult<()> {
        let mode = mode | UartMode::NOECHO;
        self.set_value("set uart mode", to_hex_arg(mode.bits().into()))
    }

    pub fn set_broadcast_interval(&mut self, seconds: u8) -> DriverResult<()> {
        self.set_value("set broadcast interval", to_hex_arg(seconds.into()))
    }

    pub fn set_time_address(&mut self, addr: &str) -> DriverResult<()> {
        self.set_value("set time address", addr)
    }

    pub fn set_time_port(&mut self, port: u16) -> DriverResult<()> {
        self.set_value("set time port", to_dec_arg(port.into()))
    }

    pub fn set_timezone(&mut self, zone: u8) -> DriverResult<()> {
        self.set_value("set time zone", to_dec_arg(zone.into()))
    }

    /// Minutes between time-server syncs; 0 disables, 1 syncs once at boot.
    pub fn set_time_enable(&mut self, minutes: u16) -> DriverResult<()> {
        self.set_value("set time enable", to_dec_arg(minutes.into()))
    }

    pub fn set_flush_timeout(&mut self, msecs: u16) -> DriverResult<()> {
        self.set_value("set comm time", to_dec_arg(msecs.into()))
    }

    pub fn set_flush_char(&mut self, ch: u8) -> DriverResult<()> {
        self.set_value("set comm match", to_hex_arg(ch.into()))
    }

    /// Packet size that triggers a flush, clamped to the module maximum.
    pub fn set_flush_size(&mut self, size: u16) -> DriverResult<()> {
        let size = size.min(MAX_FLUSH_SIZE);
        self.set_value("set comm size", to_dec_arg(size.into()))
    }

    pub fn set_io_func(&mut self, func: u8) -> DriverResult<()> {
        self.set_value("set sys iofunc", to_hex_arg(func.into()))
    }

    /// Flush payload on `flush_char`, `flush_size` bytes or `timeout` ms of
    /// silence, whichever comes first.
    pub fn enable_data_trigger(
        &mut self,
        timeout: u16,
        flush_char: u8,
        flush_size: u16,
    ) -> DriverResult<()> {
        self.with_request(|wifly| {
            let mode = wifly.uart_mode()? | UartMode::DATA_TRIGGER;
            wifly.set_uart_mode(mode)?;
            wifly.set_flush_timeout(timeout)?;
            wifly.set_flush_char(flush_char)?;
            wifly.set_flush_size(flush_size)
        })
    }

    pub fn disable_data_trigger(&mut self) -> DriverResult<()> {
        self.with_request(|wifly| {
            let mode = wifly.uart_mode()? - UartMode::DATA_TRIGGER;
            wifly.set_uart_mode(mode)?;
            wifly.set_flush_timeout(10)?;
            wifly.set_flush_char(0)?;
            wifly.set_flush_size(64)
        })
    }

    /// Switch the module's baud rate immediately.
    ///
    /// The module leaves command mode and answers at the new rate right
    /// away; follow up with a matching change on the transport.
    pub fn set_baud(&mut self, baud: u32) -> DriverResult<()> {
        self.begin_request()?;
        // No prompt follows at the old rate, so a timeout after AOK is normal.
        match self.set_value("set u i", to_dec_arg(baud)) {
            Ok(()) => {
                debug!(baud, "module switched baud rate");
                self.force_data_mode();
                Ok(())
            }
            Err(err) => self.finish_request(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::ModeState;
    use super::*;

    #[test]
    fn test_split_host() {
        assert_eq!(split_host("10.0.0.5:2000"), (Ipv4Addr::new(10, 0, 0, 5), 2000));
        assert_eq!(split_host("0.0.0.0"), (Ipv4Addr::UNSPECIFIED, 0));
    }

    #[test]
    fn test_typed_getters() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"show rssi\r", b"RSSI=(-72) dBm\r\n");
        expect_exit(&port);
        assert_eq!(wifly.rssi().unwrap(), -72);

        expect_entry(&port);
        expect_command(&port, b"get u\r", b"Baudrate=9600\r\nFlow=0x0\r\nMode=0x21\r\n");
        expect_exit(&port);
        assert_eq!(wifly.uart_mode().unwrap(), UartMode::from_bits_retain(0x21));

        expect_entry(&port);
        expect_command(&port, b"get ip\r", b"IF=UP\r\nHOST=10.0.0.9:8080\r\n");
        expect_exit(&port);
        assert_eq!(wifly.host().unwrap(), (Ipv4Addr::new(10, 0, 0, 9), 8080));

        expect_entry(&port);
        expect_command(&port, b"get ip\r", b"IF=UP\r\nDHCP=SERVER\r\n");
        expect_exit(&port);
        assert_eq!(wifly.dhcp_mode().unwrap(), DhcpMode::Server);
    }

    #[test]
    fn test_hex_setters() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"set ip flags 0x83\r", b"AOK\r\n");
        expect_exit(&port);
        wifly
            .set_ip_flags(IpFlags::TCP_KEEP | IpFlags::TCP_NODELAY | IpFlags::ADD_TIMESTAMP)
            .unwrap();

        expect_entry(&port);
        expect_command(&port, b"set uart mode 0x11\r", b"AOK\r\n");
        expect_exit(&port);
        wifly.set_uart_mode(UartMode::RX_BUFFER).unwrap();
        assert_eq!(port.pending_steps(), 0);
    }

    #[test]
    fn test_flush_size_is_clamped() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"set comm size 1460\r", b"AOK\r\n");
        expect_exit(&port);

        wifly.set_flush_size(4000).unwrap();
        assert_eq!(port.pending_steps(), 0);
    }

    #[test]
    fn test_passphrase_hides_credentials() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"set wlan phrase two$words\r", b"AOK\r\n");
        expect_exit(&port);
        expect_entry(&port);
        expect_command(&port, b"set wlan hide 1\r", b"AOK\r\n");
        expect_exit(&port);

        wifly.set_passphrase("two words").unwrap();
        assert_eq!(port.pending_steps(), 0);
    }

    #[test]
    fn test_space_replacement_updates_driver() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"set opt replace 0x2B\r", b"AOK\r\n");
        expect_exit(&port);
        wifly.set_space_replacement('+').unwrap();

        expect_entry(&port);
        expect_command(&port, b"set wlan ssid My+Net\r", b"AOK\r\n");
        expect_exit(&port);
        wifly.set_ssid("My Net").unwrap();

        assert!(wifly.set_space_replacement(' ').is_err());
    }

    #[test]
    fn test_host_pair_is_one_session() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"set ip host 10.0.0.9\r", b"AOK\r\n");
        expect_command(&port, b"set ip remote 2000\r", b"AOK\r\n");
        expect_exit(&port);

        wifly.set_host("10.0.0.9", 2000).unwrap();
        assert_eq!(port.written_text().matches("$$$").count(), 1);
    }

    #[test]
    fn test_instant_baud_change_leaves_command_mode() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        port.respond_to(b"set u i 115200\r", b"AOK\r\n");

        wifly.set_baud(115_200).unwrap();
        assert_eq!(wifly.mode_state(), ModeState::Data);
        assert_eq!(wifly.request_depth(), 0);
        assert!(!port.written_text().contains("exit"));
    }

    #[test]
    fn test_argument_validation() {
        let (mut wifly, port) = driver();
        assert!(matches!(
            wifly.set_channel(14),
            Err(DriverError::InvalidArgument(_))
        ));
        assert!(wifly.set_dhcp_code(10).is_err());
        assert!(port.written().is_empty());
    }
}
