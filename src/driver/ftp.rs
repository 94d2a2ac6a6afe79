//! FTP client settings and firmware fetch.

use super::WiFly;
use crate::codec::{to_dec_arg, to_hex_arg};
use crate::error::DriverResult;
use crate::port::Transport;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Module FTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtpSettings {
    pub address: String,
    pub port: u16,
    pub directory: String,
    pub user: String,
    pub password: String,
    pub filename: String,
    /// Transfer timeout in milliseconds.
    pub timer_ms: u32,
    pub mode: u8,
}

impl Default for FtpSettings {
    /// The vendor's firmware update server.
    fn default() -> Self {
        Self {
            address: "208.109.78.34".to_string(),
            port: 21,
            directory: "public".to_string(),
            user: "roving".to_string(),
            password: "Pass123".to_string(),
            filename: "wifly-EZX.img".to_string(),
            timer_ms: 10_000,
            mode: 0,
        }
    }
}

/// The module counts the FTP timer in 1/8 s ticks.
const FTP_TIMER_TICK_MS: u32 = 125;

impl<T: Transport> WiFly<T> {
    pub fn set_ftp_address(&mut self, addr: &str) -> DriverResult<()> {
        self.set_value("set ftp address", addr)
    }

    pub fn set_ftp_port(&mut self, port: u16) -> DriverResult<()> {
        self.set_value("set ftp remote", to_dec_arg(port.into()))
    }

    pub fn set_ftp_directory(&mut self, dir: &str) -> DriverResult<()> {
        self.set_value("set ftp dir", dir)
    }

    pub fn set_ftp_user(&mut self, user: &str) -> DriverResult<()> {
        self.set_value("set ftp user", user)
    }

    pub fn set_ftp_password(&mut self, password: &str) -> DriverResult<()> {
        self.set_value("set ftp password", password)
    }

    pub fn set_ftp_filename(&mut self, filename: &str) -> DriverResult<()> {
        self.set_value("set ftp filename", filename)
    }

    pub fn set_ftp_timer(&mut self, msecs: u32) -> DriverResult<()> {
        self.set_value("set ftp timer", to_dec_arg(msecs / FTP_TIMER_TICK_MS))
    }

    pub fn set_ftp_mode(&mut self, mode: u8) -> DriverResult<()> {
        self.set_value("set ftp mode", to_hex_arg(mode.into()))
    }

    /// Apply every FTP setting in one command-mode session.
    pub fn set_ftp(&mut self, settings: &FtpSettings) -> DriverResult<()> {
        self.with_request(|wifly| {
            wifly.set_ftp_address(&settings.address)?;
            wifly.set_ftp_directory(&settings.directory)?;
            wifly.set_ftp_user(&settings.user)?;
            wifly.set_ftp_password(&settings.password)?;
            wifly.set_ftp_filename(&settings.filename)?;
            wifly.set_ftp_timer(settings.timer_ms)?;
            wifly.set_ftp_port(settings.port)?;
            wifly.set_ftp_mode(settings.mode)
        })
    }

    pub fn set_ftp_defaults(&mut self) -> DriverResult<()> {
        self.set_ftp(&FtpSettings::default())
    }

    /// Start fetching `filename` from an FTP server.
    ///
    /// The transfer runs on the module; its progress is not tracked.
    pub fn ftp_get(
        &mut self,
        addr: &str,
        dir: &str,
        user: &str,
        password: &str,
        filename: &str,
    ) -> DriverResult<()> {
        self.with_request(|wifly| {
            wifly.set_ftp_address(addr)?;
            wifly.set_ftp_directory(dir)?;
            wifly.set_ftp_user(user)?;
            wifly.set_ftp_password(password)?;
            wifly.link.send(format!("ftp get {filename}\r").as_bytes())?;
            info!(addr, filename, "ftp transfer started");
            Ok(())
        })
    }
}
