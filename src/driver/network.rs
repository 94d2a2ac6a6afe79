//! Association, name lookup, ping and UDP retargeting.

use super::WiFly;
use crate::codec::{is_dot_quad, parse_ip, substitute_spaces};
use crate::error::{DriverError, DriverResult};
use crate::port::Transport;
use crate::protocol::find;
use crate::protocol::literals::{ASSOCIATED, DHCP_GATEWAY, PING_REPLY, PING_TRY};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

impl<T: Transport> WiFly<T> {
    /// Join a network; `None` joins the SSID stored on the module.
    ///
    /// With DHCP enabled the call also waits for the lease.
    pub fn join(&mut self, ssid: Option<&str>) -> DriverResult<()> {
        let ssid = match ssid {
            Some(ssid) => ssid.to_string(),
            None => self.ssid()?,
        };

        self.with_request(|wifly| {
            let arg = substitute_spaces(&ssid, wifly.module.space_replacement);
            wifly.link.send(format!("join {arg}\r").as_bytes())?;

            if !find(&mut wifly.link, ASSOCIATED, wifly.timing.join)? {
                warn!(%ssid, "association failed");
                wifly.diag(&format!("Failed to join {ssid}"));
                return Err(DriverError::JoinFailed {
                    reason: format!("no association with {ssid}"),
                });
            }
            wifly.status.associated = true;
            info!(%ssid, "associated");

            if wifly.dhcp {
                if find(&mut wifly.link, DHCP_GATEWAY, wifly.timing.dhcp)? {
                    let gateway = wifly.link.read_line(wifly.timing.command)?;
                    debug!(?gateway, "DHCP lease");
                } else {
                    warn!("no DHCP lease reported");
                }
            }
            wifly.link.flush_rx(wifly.timing.flush)?;
            Ok(())
        })
    }

    pub fn leave(&mut self) -> DriverResult<()> {
        self.with_request(|wifly| {
            wifly.link.send(b"leave\r")?;
            wifly.link.flush_rx(wifly.timing.flush)?;
            wifly.status.associated = false;
            info!("left network");
            Ok(())
        })
    }

    /// True after a successful `join` until `leave`, or as last reported by
    /// the status register.
    pub fn is_associated(&self) -> bool {
        self.status.associated
    }

    /// Resolve `host` through the module's DNS client.
    pub fn lookup(&mut self, host: &str) -> DriverResult<Ipv4Addr> {
        self.with_request(|wifly| {
            wifly.link.send(format!("lookup {host}\r").as_bytes())?;

            if !find(&mut wifly.link, host.as_bytes(), wifly.timing.lookup)? {
                wifly.await_prompt()?;
                return Err(DriverError::LookupFailed {
                    host: host.to_string(),
                });
            }
            // Skip the '='.
            wifly.link.read_timeout(wifly.timing.command)?;
            let addr = wifly
                .link
                .read_line(wifly.timing.command)?
                .ok_or_else(|| DriverError::timeout(format!("address of {host}")))?;
            wifly.await_prompt()?;

            debug!(host, %addr, "resolved");
            Ok(parse_ip(&addr))
        })
    }

    /// Ping `host`, resolving it first unless it is a dotted quad.
    pub fn ping(&mut self, host: &str) -> DriverResult<()> {
        let addr = if is_dot_quad(host) {
            host.to_string()
        } else {
            self.lookup(host)?.to_string()
        };

        self.with_request(|wifly| {
            wifly.link.send(format!("ping {addr}\r").as_bytes())?;

            let failed = || DriverError::PingFailed {
                host: host.to_string(),
            };
            if !find(&mut wifly.link, PING_TRY, wifly.timing.command)? {
                return Err(failed());
            }
            wifly.link.read_line(wifly.timing.command)?;
            if !wifly.await_prompt()? {
                return Err(failed());
            }
            if !find(&mut wifly.link, PING_REPLY, wifly.timing.ping)? {
                wifly.diag(&format!("No ping reply from {host}"));
                return Err(failed());
            }
            wifly.link.read_line(wifly.timing.command)?;
            info!(host, "ping reply");
            Ok(())
        })
    }

    /// Send one UDP datagram to `host:port`.
    ///
    /// The module's remote host is retargeted if it differs and, with host
    /// restore enabled, put back afterwards.
    pub fn send_to(&mut self, data: &[u8], host: &str, port: u16) -> DriverResult<()> {
        let previous = self.with_request(|wifly| {
            let (last_host, last_port) = wifly.host()?;
            if last_host.to_string() != host || last_port != port {
                wifly.set_host_ip(host)?;
                wifly.set_host_port(port)?;
                Ok(Some((last_host, last_port)))
            } else {
                Ok(None)
            }
        })?;

        self.link.send(data)?;

        if self.module.restore_host {
            if let Some((last_host, last_port)) = previous {
                debug!(%last_host, last_port, "restoring remote host");
                self.set_host(&last_host.to_string(), last_port)?;
            }
        }
        Ok(())
    }

    pub fn enable_host_restore(&mut self) {
        self.module.restore_host = true;
    }

    pub fn disable_host_restore(&mut self) {
        self.module.restore_host = false;
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn test_join_waits_for_lease() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        port.respond_to(
            b"join Home$Net\r",
            b"Auto-Assoc Home Net chan=6 mode=WPA2 SCAN OK\r\nAssociated!\r\n\
              DHCP: Start\r\nIP=10.0.0.7:2000\r\nNM=255.255.255.0\r\nGW=10.0.0.1\r\n",
        );
        expect_exit(&port);

        wifly.join(Some("Home Net")).unwrap();
        assert!(wifly.is_associated());
        assert_eq!(port.pending_steps(), 0);
    }

    #[test]
    fn test_join_failure() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        port.respond_to(b"join Nowhere\r", b"Auto-Assoc Nowhere SCAN FAILED\r\n");
        expect_exit(&port);

        let err = wifly.join(Some("Nowhere")).unwrap_err();
        assert!(matches!(err, DriverError::JoinFailed { .. }));
        assert!(!wifly.is_associated());
        assert!(!wifly.is_in_command_mode());
    }

    #[test]
    fn test_lookup() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"lookup example.com\r", b"example.com=93.184.216.34\r\n");
        expect_exit(&port);

        assert_eq!(
            wifly.lookup("example.com").unwrap(),
            Ipv4Addr::new(93, 184, 216, 34)
        );
    }

    #[test]
    fn test_ping_dot_quad() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        port.respond_to(
            b"ping 10.0.0.1\r",
            b"Ping try 1\r\n<4.00> 64 bytes from 10.0.0.1: icmp_seq=1\r\n",
        );
        expect_exit(&port);

        wifly.ping("10.0.0.1").unwrap();
        assert!(!port.written_text().contains("lookup"));
    }

    #[test]
    fn test_ping_without_reply() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"ping 10.0.0.2\r", b"Ping try 1\r\n");
        expect_exit(&port);

        assert!(matches!(
            wifly.ping("10.0.0.2"),
            Err(DriverError::PingFailed { .. })
        ));
    }

    #[test]
    fn test_send_to_retargets_and_restores() {
        let (mut wifly, port) = driver();
        expect_entry(&port);
        expect_command(&port, b"get ip\r", b"IF=UP\r\nHOST=10.0.0.1:2000\r\n");
        expect_command(&port, b"set ip host 10.0.0.9\r", b"AOK\r\n");
        expect_command(&port, b"set ip remote 2000\r", b"AOK\r\n");
        expect_exit(&port);
        expect_entry(&port);
        expect_command(&port, b"set ip host 10.0.0.1\r", b"AOK\r\n");
        expect_command(&port, b"set ip remote 2000\r", b"AOK\r\n");
        expect_exit(&port);

        wifly.send_to(b"hello", "10.0.0.9", 2000).unwrap();
        assert_eq!(port.pending_steps(), 0);
        assert!(port.written_text().contains("exit\rhello$$$"));
    }

    #[test]
    fn test_send_to_same_host_skips_retarget() {
        let (mut wifly, port) = driver();
        wifly.disable_host_restore();
        expect_entry(&port);
        expect_command(&port, b"get ip\r", b"HOST=10.0.0.1:2000\r\n");
        expect_exit(&port);

        wifly.send_to(b"x", "10.0.0.1", 2000).unwrap();
        assert_eq!(port.written_text(), "$$$get ip\rexit\rx");
    }
}
