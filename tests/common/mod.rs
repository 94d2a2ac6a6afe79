//! Shared test utilities for WiFly driver tests.
//!
//! This module provides common test infrastructure including:
//! - A scripted mock module with the usual console replies
//! - Driver construction with short timing budgets
//! - Write-log assertion helpers

#![allow(dead_code)]

use wifly_driver::{MockTransport, Timing, WiFly};

pub const PROMPT: &[u8] = b"<4.00> ";

/// A mock module console that scripts replies the way the firmware sends
/// them.
///
/// # Example
/// ```ignore
/// let module = ScriptedModule::new();
/// module.command_session(&[(b"get ip\r", b"IP=10.0.0.7:2000\r\n")]);
/// ```
#[derive(Clone)]
pub struct ScriptedModule {
    pub port: MockTransport,
}

impl ScriptedModule {
    pub fn new() -> Self {
        Self {
            port: MockTransport::new("MOCK0"),
        }
    }

    /// A driver on this module with quick timing and a learned prompt.
    pub fn driver(&self) -> WiFly<MockTransport> {
        let mut wifly = WiFly::with_timing(self.port.clone(), Timing::quick());
        // First entry learns the prompt.
        self.port.respond_to(b"$$$", b"CMD\r\n");
        self.port.respond_to(b"\r", b"\r\n<4.00> ");
        self.port.respond_to(b"exit\r", b"EXIT\r\n");
        wifly.enter_command_mode().expect("prompt learning");
        wifly.exit_command_mode().expect("exit");
        self.port.clear_write_log();
        wifly
    }

    pub fn entry(&self) {
        self.port.respond_to(b"$$$", b"CMD\r\n");
    }

    pub fn exit(&self) {
        self.port.respond_to(b"exit\r", b"EXIT\r\n");
    }

    /// One command answered by `reply` and the prompt.
    pub fn command(&self, command: &[u8], reply: &[u8]) {
        let mut response = reply.to_vec();
        response.extend_from_slice(PROMPT);
        self.port.respond_to(command, &response);
    }

    /// `$$$`, the given commands, `exit`.
    pub fn command_session(&self, steps: &[(&[u8], &[u8])]) {
        self.entry();
        for (command, reply) in steps {
            self.command(command, reply);
        }
        self.exit();
    }

    /// Bytes arriving from the module without a trigger.
    pub fn receive(&self, bytes: &[u8]) {
        self.port.enqueue_read(bytes);
    }

    pub fn written(&self) -> String {
        self.port.written_text()
    }

    pub fn count_written(&self, needle: &str) -> usize {
        self.written().matches(needle).count()
    }

    pub fn script_done(&self) -> bool {
        self.port.pending_steps() == 0
    }
}

impl Default for ScriptedModule {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a connection to `10.0.0.5:80` and clear the write log.
pub fn open_connection(module: &ScriptedModule, wifly: &mut WiFly<MockTransport>) {
    module.entry();
    module.command(b"open 10.0.0.5 80\r", b"Connect to 10.0.0.5:80\r\n");
    module.port.respond_to(b"", b"*OPEN*");
    wifly.open("10.0.0.5", 80, true).expect("open");
    module.port.clear_write_log();
}
