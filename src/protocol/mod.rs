//! Console protocol building blocks.
//!
//! Stateless or self-contained pieces the driver composes: the streaming
//! matcher, the read-ahead buffer, prompt learning, the option table and the
//! fixed console literals.

pub mod matcher;
pub mod opcodes;
pub mod peek;
pub mod prompt;

pub use matcher::{find, find_any, ByteSource, SliceSource};
pub use opcodes::{OptionId, OptionRequest, OPTION_TABLE};
pub use peek::{PeekBuffer, PEEK_CAPACITY};
pub use prompt::{PromptTracker, PROMPT_MAX_LEN};

/// Fixed console literals.
pub mod literals {
    pub const ESCAPE: &[u8] = b"$$$";
    pub const CMD_ACK: &[u8] = b"CMD\r\n";
    pub const EXIT: &[u8] = b"exit\r";
    pub const EXIT_ACK: &[u8] = b"EXIT\r\n";
    pub const AOK: &[u8] = b"AOK\r\n";
    pub const ERR: &[u8] = b"ERR: ";
    pub const OPEN_MARKER: &[u8] = b"*OPEN*";
    pub const CLOSE_MARKER: &[u8] = b"*CLOS*";
    pub const CLOSE: &[u8] = b"close\r";
    pub const SHOW_CONNECTION: &[u8] = b"show c\r";
    pub const SAVE: &[u8] = b"save\r";
    pub const SAVE_ACK: &[u8] = b"Storing";
    pub const REBOOT: &[u8] = b"reboot\r";
    pub const REBOOT_ACK: &[u8] = b"*Reboot*";
    pub const FACTORY_RESTORE: &[u8] = b"factory RESTORE\r";
    pub const FACTORY_ACK: &[u8] = b"Set Factory Defaults";
    pub const ASSOCIATED: &[u8] = b"Associated!";
    pub const DHCP_GATEWAY: &[u8] = b"GW=";
    pub const PING_TRY: &[u8] = b"Ping try";
    pub const PING_REPLY: &[u8] = b"64 bytes";
    /// Diagnostic used when a reply never arrived.
    pub const TIMEOUT_DIAGNOSTIC: &str = "<timeout>";
}
