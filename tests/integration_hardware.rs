//! Hardware integration tests.
//!
//! These tests need a module on a real serial port and are ignored by default.
//!
//! # Running These Tests
//!
//! ```bash
//! WIFLY_TEST_PORT=/dev/ttyUSB0 cargo test --features hardware-tests -- --ignored
//!
//! # Connection test against a reachable TCP echo server
//! WIFLY_TEST_PORT=/dev/ttyUSB0 WIFLY_TEST_HOST=192.168.1.10 WIFLY_TEST_TCP_PORT=7 \
//!     cargo test --features hardware-tests -- --ignored test_real_open_close
//! ```

#![cfg(feature = "hardware-tests")]

use std::time::Duration;
use wifly_driver::{Config, OptionId, SyncSerialPort, WiFly};

struct TestPortConfig {
    port_name: String,
    baud_rate: u32,
}

impl TestPortConfig {
    fn from_env() -> Option<Self> {
        let port_name = std::env::var("WIFLY_TEST_PORT").ok()?;
        let baud_rate = std::env::var("WIFLY_TEST_BAUD")
            .ok()
            .and_then(|b| b.parse().ok())
            .unwrap_or(9600);
        Some(Self {
            port_name,
            baud_rate,
        })
    }

    fn driver(&self) -> WiFly<SyncSerialPort> {
        let mut config = Config::default();
        config.serial.baud = self.baud_rate;
        let port = SyncSerialPort::open(&self.port_name, config.serial.port_configuration())
            .expect("Failed to open test port");
        WiFly::new(port, &config)
    }
}

macro_rules! test_port_or_skip {
    () => {
        match TestPortConfig::from_env() {
            Some(c) => c,
            None => {
                println!("Skipping: WIFLY_TEST_PORT not set");
                return;
            }
        }
    };
}

#[test]
#[ignore] // Requires hardware
fn test_real_begin_and_status() {
    let config = test_port_or_skip!();
    let mut wifly = config.driver();

    wifly.begin().expect("begin");

    let prompt = wifly.prompt().expect("prompt learned");
    assert!(prompt.starts_with('<') && prompt.ends_with("> "), "{prompt:?}");
    let status = wifly.poll_status().expect("status");
    println!("status register: 0x{:04x} ({status:?})", status.raw);
    assert_eq!(wifly.request_depth(), 0);
}

#[test]
#[ignore] // Requires hardware
fn test_real_option_reads() {
    let config = test_port_or_skip!();
    let mut wifly = config.driver();

    for id in [OptionId::Mac, OptionId::Ip, OptionId::Ssid, OptionId::DeviceId] {
        let value = wifly.get_option(id).expect("option read");
        println!("{id}: {value}");
    }
    let mac = wifly.mac().expect("mac");
    assert_eq!(mac.split(':').count(), 6, "{mac}");
}

#[test]
#[ignore] // Requires hardware
fn test_real_rejected_setting() {
    let config = test_port_or_skip!();
    let mut wifly = config.driver();

    let err = wifly
        .set_option("set bogus option", Some("1"))
        .expect_err("module should reject an unknown command");
    println!("rejected: {}", err.diagnostic());
    assert!(!wifly.is_in_command_mode());
}

#[test]
#[ignore] // Requires hardware and a TCP server
fn test_real_open_close() {
    let config = test_port_or_skip!();
    let Ok(host) = std::env::var("WIFLY_TEST_HOST") else {
        println!("Skipping: WIFLY_TEST_HOST not set");
        return;
    };
    let port: u16 = std::env::var("WIFLY_TEST_TCP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(7);
    let mut wifly = config.driver();
    wifly.begin().expect("begin");

    wifly.open(&host, port, true).expect("open");
    assert!(wifly.is_connected());
    wifly.write(b"ping\r\n").expect("write");
    std::thread::sleep(Duration::from_millis(500));
    println!("{} bytes waiting", wifly.available().expect("available"));

    wifly.close().expect("close");
    assert!(!wifly.is_connected());
}
