//! Option reads and writes.

use super::WiFly;
use crate::codec::substitute_spaces;
use crate::error::{DriverError, DriverResult};
use crate::port::Transport;
use crate::protocol::literals::{AOK, ERR};
use crate::protocol::{find, find_any, OptionId};
use tracing::{debug, warn};

impl<T: Transport> WiFly<T> {
    /// Read one option value.
    ///
    /// Sends the option's request, scans for its response prefix and
    /// returns the rest of that line.
    pub fn get_option(&mut self, id: OptionId) -> DriverResult<String> {
        self.with_request(|wifly| {
            wifly.link.send(id.request().as_bytes())?;

            if !find(&mut wifly.link, id.response().as_bytes(), wifly.timing.command)? {
                wifly.diag(&format!("{id}: <timeout>"));
                return Err(DriverError::timeout(id.response()));
            }
            let value = wifly
                .link
                .read_line(wifly.timing.command)?
                .ok_or_else(|| DriverError::timeout(format!("{id} value")))?;
            wifly.await_prompt()?;

            debug!(option = %id, %value, "read option");
            Ok(value)
        })
    }

    /// Send `command`, optionally followed by an argument, and wait for
    /// `AOK` or `ERR:`.
    ///
    /// Spaces inside the argument are replaced by the configured
    /// replacement character. The prompt is awaited whatever the outcome.
    pub fn set_option(&mut self, command: &str, arg: Option<&str>) -> DriverResult<()> {
        self.with_request(|wifly| {
            let mut line = String::from(command);
            if let Some(arg) = arg {
                line.push(' ');
                line.push_str(&substitute_spaces(arg, wifly.module.space_replacement));
            }
            line.push('\r');
            wifly.link.send(line.as_bytes())?;

            let result = match find_any(&mut wifly.link, &[ERR, AOK], wifly.timing.command)? {
                Some(0) => {
                    let reason = wifly
                        .link
                        .read_line(wifly.timing.command)?
                        .unwrap_or_default();
                    warn!(command, %reason, "module rejected command");
                    wifly.diag(&format!("{command}: ERR: {reason}"));
                    Err(DriverError::rejected(reason))
                }
                Some(_) => Ok(()),
                None => {
                    warn!(command, "no reply");
                    wifly.diag(&format!("{command}: <timeout>"));
                    Err(DriverError::timeout("AOK"))
                }
            };
            wifly.await_prompt()?;
            result
        })
    }

    /// `set_option` for a numeric argument already formatted by the caller.
    pub(crate) fn set_value(&mut self, command: &str, value: impl AsRef<str>) -> DriverResult<()> {
        self.set_option(command, Some(value.as_ref()))
    }
}
