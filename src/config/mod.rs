//! Configuration module for the WiFly driver and its command-line tool.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `WIFLY_CONFIG` environment variable (explicit path)
//! 2. `./wifly.toml` (current directory)
//! 3. `wifly/wifly.toml` under the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The common values can be overridden via environment variables following
//! `WIFLY_<SECTION>_<KEY>`, e.g. `WIFLY_SERIAL_PORT=/dev/ttyUSB0` or
//! `WIFLY_TIMING_COMMAND_MS=750`.
//!
//! # Example
//!
//! ```rust,ignore
//! use wifly_driver::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let timing = loader.config().timing_runtime();
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    Config, LogFormat, LoggingConfig, ModuleConfig, SerialConfig, Timing, TimingConfig,
};

impl Config {
    /// Duration-typed timing budgets for the driver.
    pub fn timing_runtime(&self) -> Timing {
        Timing::from(&self.timing)
    }
}
