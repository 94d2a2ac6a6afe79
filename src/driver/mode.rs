//! Command-mode state machine.
//!
//! The module only accepts commands after the `$$$` escape. Operations that
//! need several commands bracket them with `begin_request`/`end_request`;
//! the depth counter makes nested brackets share one entry and one exit.
//! An explicit [`WiFly::enter_command_mode`] pins command mode: brackets run
//! inside it without leaving until [`WiFly::exit_command_mode`].

use super::WiFly;
use crate::error::{DriverError, DriverResult};
use crate::port::Transport;
use crate::protocol::literals::{CMD_ACK, ESCAPE, EXIT, EXIT_ACK};
use crate::protocol::find;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeState {
    /// Bytes written go to the remote peer.
    Data,
    /// Bytes written are console commands.
    Command,
}

impl<T: Transport> WiFly<T> {
    pub fn mode_state(&self) -> ModeState {
        self.mode
    }

    pub fn is_in_command_mode(&self) -> bool {
        self.mode == ModeState::Command
    }

    /// Current request nesting depth.
    pub fn request_depth(&self) -> u32 {
        self.depth
    }

    /// Switch the module to command mode and keep it there.
    ///
    /// Requests issued afterwards do not leave command mode when they finish;
    /// only [`WiFly::exit_command_mode`] does.
    pub fn enter_command_mode(&mut self) -> DriverResult<()> {
        self.establish_command_mode()?;
        self.pinned = true;
        Ok(())
    }

    /// Succeeds without I/O when already in command mode. Otherwise sends
    /// `$$$` inside guard silences; if that is not acknowledged, sends a bare
    /// CR in case the module was already in command mode, then retries the
    /// escape.
    fn establish_command_mode(&mut self) -> DriverResult<()> {
        if self.mode == ModeState::Command {
            return Ok(());
        }
        debug!("entering command mode");

        if self.send_escape()? && self.ensure_prompt()? {
            self.command_mode_established();
            return Ok(());
        }

        self.link.send(b"\r")?;
        if self.await_prompt()? {
            debug!("module was already in command mode");
            self.command_mode_established();
            return Ok(());
        }

        for attempt in 1..=self.timing.entry_retries {
            debug!(attempt, "retrying escape");
            if self.send_escape()? && self.ensure_prompt()? {
                self.command_mode_established();
                return Ok(());
            }
        }

        warn!("module did not enter command mode");
        self.diag("Failed to enter command mode");
        Err(DriverError::ModeEntry)
    }

    /// Leave command mode.
    ///
    /// If `EXIT` is not seen the module is assumed to still be in command
    /// mode and the state stays `Command`, pinned or not.
    pub fn exit_command_mode(&mut self) -> DriverResult<()> {
        if self.mode == ModeState::Data {
            self.pinned = false;
            return Ok(());
        }
        self.link.send(EXIT)?;

        if find(&mut self.link, EXIT_ACK, self.timing.command)? {
            debug!("left command mode");
            self.force_data_mode();
            Ok(())
        } else {
            warn!("module did not acknowledge exit");
            self.diag("Failed to exit");
            Err(DriverError::ModeExit)
        }
    }

    pub(crate) fn begin_request(&mut self) -> DriverResult<()> {
        if self.mode != ModeState::Command {
            self.establish_command_mode()?;
        }
        self.depth += 1;
        Ok(())
    }

    /// Close one level of nesting; the outermost level leaves command mode
    /// unless it is pinned.
    pub(crate) fn end_request(&mut self) -> DriverResult<()> {
        if self.depth == 0 {
            return Ok(());
        }
        self.depth -= 1;
        if self.depth == 0 && !self.pinned {
            self.exit_command_mode()
        } else {
            Ok(())
        }
    }

    /// End the current request and report `result`, or the exit failure if
    /// `result` was a success.
    pub(crate) fn finish_request<R>(&mut self, result: DriverResult<R>) -> DriverResult<R> {
        let ended = self.end_request();
        match result {
            Ok(value) => ended.map(|_| value),
            Err(err) => {
                if let Err(exit_err) = ended {
                    debug!(%exit_err, "exit failed after an earlier error");
                }
                Err(err)
            }
        }
    }

    /// Run `body` inside a request bracket.
    pub(crate) fn with_request<R>(
        &mut self,
        body: impl FnOnce(&mut Self) -> DriverResult<R>,
    ) -> DriverResult<R> {
        self.begin_request()?;
        let result = body(self);
        self.finish_request(result)
    }

    /// The module left command mode on its own (connection opened, baud
    /// change, reboot).
    pub(crate) fn force_data_mode(&mut self) {
        self.mode = ModeState::Data;
        self.depth = 0;
        self.pinned = false;
    }

    fn send_escape(&mut self) -> DriverResult<bool> {
        self.pause(self.timing.guard);
        self.link.send(ESCAPE)?;
        self.pause(self.timing.guard);
        Ok(find(&mut self.link, CMD_ACK, self.timing.command)?)
    }

    /// After `CMD`, learn the prompt if it is not known yet.
    fn ensure_prompt(&mut self) -> DriverResult<bool> {
        if self.prompt.is_learned() {
            return Ok(true);
        }
        for _ in 0..self.timing.entry_retries.max(1) {
            self.link.send(b"\r")?;
            if self.prompt.learn(&mut self.link, self.timing.command)? {
                return Ok(true);
            }
        }
        warn!("no prompt after CMD");
        Ok(false)
    }

    fn command_mode_established(&mut self) {
        debug!("in command mode");
        self.mode = ModeState::Command;
    }
}
