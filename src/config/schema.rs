//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use crate::port::PortConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Protocol timing budgets
    pub timing: TimingConfig,
    /// Module behaviour
    pub module: ModuleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Serial link configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path; `None` means it must be given on the command line
    pub port: Option<String>,
    /// Baud rate the module is configured for
    pub baud: u32,
    /// OS-level read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: 9600,
            read_timeout_ms: 10,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Build the transport-level configuration
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud,
            timeout: Duration::from_millis(self.read_timeout_ms),
            ..PortConfiguration::default()
        }
    }
}

/// Protocol timing section. All values in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Silence kept before and after `$$$`
    pub guard_ms: u64,
    /// Per-byte wait for ordinary command replies
    pub command_ms: u64,
    /// Per-byte wait while probing for `*CLOS*`/`*OPEN*`
    pub notification_ms: u64,
    /// Wait for the outcome of a blocking open
    pub open_ms: u64,
    /// Wait for `Associated!` after `join`
    pub join_ms: u64,
    /// Wait for the DHCP lease after association
    pub dhcp_ms: u64,
    /// Wait for a DNS lookup result
    pub lookup_ms: u64,
    /// Wait for a ping reply
    pub ping_ms: u64,
    /// Quiet period that ends an input flush
    pub flush_ms: u64,
    /// Settle time after `*Reboot*`
    pub reboot_settle_ms: u64,
    /// Extra `$$$` attempts after the first entry attempt and the bare-CR check fail
    pub entry_retries: u32,
    /// Sleep between availability polls
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            guard_ms: 250,
            command_ms: 500,
            notification_ms: 50,
            open_ms: 10_000,
            join_ms: 10_000,
            dhcp_ms: 15_000,
            lookup_ms: 5_000,
            ping_ms: 5_000,
            flush_ms: 100,
            reboot_settle_ms: 5_000,
            entry_retries: 5,
            poll_interval_ms: 1,
        }
    }
}

/// Runtime form of [`TimingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub guard: Duration,
    pub command: Duration,
    pub notification: Duration,
    pub open: Duration,
    pub join: Duration,
    pub dhcp: Duration,
    pub lookup: Duration,
    pub ping: Duration,
    pub flush: Duration,
    pub reboot_settle: Duration,
    pub entry_retries: u32,
    pub poll_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for Timing {
    fn from(cfg: &TimingConfig) -> Self {
        Self {
            guard: Duration::from_millis(cfg.guard_ms),
            command: Duration::from_millis(cfg.command_ms),
            notification: Duration::from_millis(cfg.notification_ms),
            open: Duration::from_millis(cfg.open_ms),
            join: Duration::from_millis(cfg.join_ms),
            dhcp: Duration::from_millis(cfg.dhcp_ms),
            lookup: Duration::from_millis(cfg.lookup_ms),
            ping: Duration::from_millis(cfg.ping_ms),
            flush: Duration::from_millis(cfg.flush_ms),
            reboot_settle: Duration::from_millis(cfg.reboot_settle_ms),
            entry_retries: cfg.entry_retries,
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
        }
    }
}

impl Timing {
    /// Short budgets for loopback and mock transports, where every reply is
    /// already queued when it is looked for.
    pub fn quick() -> Self {
        let ms = Duration::from_millis;
        Self {
            guard: Duration::ZERO,
            command: ms(20),
            notification: ms(5),
            open: ms(50),
            join: ms(50),
            dhcp: ms(50),
            lookup: ms(50),
            ping: ms(50),
            flush: ms(5),
            reboot_settle: Duration::ZERO,
            entry_retries: 2,
            poll_interval: Duration::ZERO,
        }
    }
}

/// Module behaviour section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Character the module turns back into a space inside arguments
    pub space_replacement: char,
    /// Restore the previous remote host after `send_to`
    pub restore_host: bool,
    /// Log every received byte at trace level
    pub trace_rx: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            space_replacement: '$',
            restore_host: true,
            trace_rx: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.timing.guard_ms, 250);
        assert_eq!(config.timing.entry_retries, 5);
        assert_eq!(config.module.space_replacement, '$');
        assert!(config.module.restore_host);
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("wifly".to_string(), "/dev/ttyUSB0".to_string());

        assert_eq!(config.resolve_port("wifly"), "/dev/ttyUSB0");
        assert_eq!(config.resolve_port("COM5"), "COM5");
    }

    #[test]
    fn test_timing_conversion() {
        let timing = Timing::from(&TimingConfig::default());
        assert_eq!(timing.command, Duration::from_millis(500));
        assert_eq!(timing.open, Duration::from_secs(10));
        assert_eq!(timing.reboot_settle, Duration::from_secs(5));
        assert_eq!(Timing::default(), timing);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[timing]"));
        assert!(toml_str.contains("[module]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            baud = 115200

            [timing]
            command_ms = 750

            [module]
            space_replacement = "+"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.baud, 115200);
        assert_eq!(config.timing.command_ms, 750);
        assert_eq!(config.module.space_replacement, '+');
        // Defaults should still work
        assert_eq!(config.timing.open_ms, 10_000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
