//! Startup, persistence, reboot and console passthrough.

use super::{ConnectionState, ConnectionStatus, WiFly};
use crate::error::{DriverError, DriverResult};
use crate::port::Transport;
use crate::protocol::find;
use crate::protocol::literals::{FACTORY_ACK, FACTORY_RESTORE, REBOOT, REBOOT_ACK, SAVE, SAVE_ACK};
use tracing::{debug, info, warn};

/// Settings applied on every startup: echo off, quiet console, no greeting
/// to remote peers.
const STARTUP_SETTINGS: [(&str, &str); 3] = [
    ("set u m", "1"),
    ("set sys printlvl", "0"),
    ("set comm remote", "0"),
];

impl<T: Transport> WiFly<T> {
    /// Bring the module into the state the driver expects.
    ///
    /// Applies the startup settings, reads the status register and DHCP
    /// mode, all in one command-mode session. A rejected setting is logged
    /// and skipped.
    pub fn begin(&mut self) -> DriverResult<()> {
        self.with_request(|wifly| wifly.startup())
    }

    fn startup(&mut self) -> DriverResult<()> {
        for (command, value) in STARTUP_SETTINGS {
            if let Err(err) = self.set_value(command, value) {
                warn!(command, %err, "startup setting failed");
            }
        }

        let status = self.poll_status()?;
        if status.is_connected() {
            self.connection = ConnectionState::Open;
        }

        self.dhcp = match self.dhcp_mode() {
            Ok(mode) => mode.uses_dhcp(),
            Err(err) => {
                debug!(%err, "DHCP mode unknown; assuming enabled");
                true
            }
        };
        info!(
            prompt = ?self.prompt.text(),
            connected = self.is_connected(),
            dhcp = self.dhcp,
            "module ready"
        );
        Ok(())
    }

    /// Write the current settings to the module's flash.
    pub fn save(&mut self) -> DriverResult<()> {
        self.with_request(|wifly| {
            wifly.link.send(SAVE)?;
            if !find(&mut wifly.link, SAVE_ACK, wifly.timing.command)? {
                wifly.diag("Failed to save config");
                return Err(DriverError::timeout("Storing"));
            }
            wifly.await_prompt()?;
            info!("configuration saved");
            Ok(())
        })
    }

    /// Restart the module and run the startup sequence again.
    ///
    /// The prompt is relearned since a firmware update may change it.
    pub fn reboot(&mut self) -> DriverResult<()> {
        self.begin_request()?;
        if let Err(err) = self.request_reboot() {
            return self.finish_request(Err(err));
        }

        info!("module rebooting");
        self.pause(self.timing.reboot_settle);
        self.force_data_mode();
        self.prompt.forget();
        self.link.peek.clear();
        self.connection = ConnectionState::Closed;
        self.status = ConnectionStatus::default();

        self.begin()
    }

    fn request_reboot(&mut self) -> DriverResult<()> {
        self.link.send(REBOOT)?;
        if !find(&mut self.link, REBOOT_ACK, self.timing.command)? {
            self.diag("Failed to reboot");
            return Err(DriverError::timeout("*Reboot*"));
        }
        Ok(())
    }

    /// Restore factory defaults. Takes effect after `save` and `reboot`.
    pub fn factory_restore(&mut self) -> DriverResult<()> {
        self.with_request(|wifly| {
            wifly.link.send(FACTORY_RESTORE)?;
            if !find(&mut wifly.link, FACTORY_ACK, wifly.timing.command)? {
                return Err(DriverError::timeout("Set Factory Defaults"));
            }
            wifly.await_prompt()?;
            info!("factory defaults restored");
            Ok(())
        })
    }

    /// Shuttle bytes between the module and `console` until `escape` arrives
    /// from the console.
    ///
    /// Module bytes are passed on raw, without marker detection.
    pub fn terminal<C: Transport>(&mut self, console: &mut C, escape: u8) -> DriverResult<()> {
        info!(console = console.name(), escape, "terminal passthrough");
        loop {
            let mut idle = true;

            while let Some(b) = self.link.peek.pop() {
                console.write_bytes(&[b])?;
            }
            while let Some(b) = self.link.read_now()? {
                console.write_bytes(&[b])?;
                idle = false;
            }

            if let Some(b) = console.read_byte()? {
                if b == escape {
                    info!("terminal passthrough ended");
                    return Ok(());
                }
                self.link.send(&[b])?;
                idle = false;
            }

            if idle {
                self.link.idle();
            }
        }
    }
}
