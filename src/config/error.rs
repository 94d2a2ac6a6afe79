//! Errors from finding, parsing, checking and saving `wifly.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicit path (`--config` or `WIFLY_CONFIG`) names no file.
    #[error("wifly.toml not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed wifly.toml: {0}")]
    Malformed(#[from] toml::de::Error),

    #[error("cannot encode settings as TOML: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("cannot write {}: {source}", path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value the driver cannot run with, keyed as `section.field`.
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting {
        key: &'static str,
        reason: &'static str,
    },

    /// A `WIFLY_<SECTION>_<KEY>` override that does not parse.
    #[error("{var}={value:?} is not a valid {expected}")]
    BadOverride {
        var: String,
        value: String,
        expected: &'static str,
    },

    #[error("no file to save to; use save_to or set WIFLY_CONFIG")]
    NoPath,
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: &'static str) -> Self {
        Self::InvalidSetting { key, reason }
    }

    pub(crate) fn bad_override(var: &str, value: &str, expected: &'static str) -> Self {
        Self::BadOverride {
            var: var.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_messages_name_the_setting() {
        assert_eq!(
            ConfigError::invalid("serial.baud", "must be non-zero").to_string(),
            "invalid setting serial.baud: must be non-zero"
        );
        assert_eq!(
            ConfigError::bad_override("WIFLY_SERIAL_BAUD", "fast", "baud rate").to_string(),
            "WIFLY_SERIAL_BAUD=\"fast\" is not a valid baud rate"
        );
        assert_eq!(
            ConfigError::NotFound(Path::new("/etc/wifly/wifly.toml").to_path_buf()).to_string(),
            "wifly.toml not found at /etc/wifly/wifly.toml"
        );
    }
}
