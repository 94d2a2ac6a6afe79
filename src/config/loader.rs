//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "WIFLY";

/// Config file name
const CONFIG_FILE_NAME: &str = "wifly.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "WIFLY_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR: &str = "wifly";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `WIFLY_CONFIG` environment variable (explicit path)
    /// 2. `./wifly.toml` (current directory)
    /// 3. `<platform config dir>/wifly/wifly.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || validate(&config).is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or(ConfigError::NoPath)?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Reload configuration from file (if path is set).
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            let mut config = load_from_file(path)?;
            apply_env_overrides(&mut config)?;
            validate(&config)?;
            self.config = config;
        }
        Ok(())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR))
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(toml::from_str(&content)?)
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Unwritable {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Unwritable {
        path: path.to_path_buf(),
        source: e,
    })
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{ENV_PREFIX}_{key}");
    std::env::var(&name).ok().map(|val| (name, val))
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str, expected: &'static str) -> ConfigResult<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::bad_override(name, val, expected))
}

fn parse_flag(name: &str, val: &str) -> ConfigResult<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::bad_override(name, val, "flag")),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `WIFLY_<SECTION>_<KEY>`
/// For example:
/// - `WIFLY_SERIAL_PORT=/dev/ttyUSB0`
/// - `WIFLY_SERIAL_BAUD=115200`
/// - `WIFLY_TIMING_COMMAND_MS=750`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((_, val)) = env_var("SERIAL_PORT") {
        config.serial.port = Some(val);
    }
    if let Some((name, val)) = env_var("SERIAL_BAUD") {
        config.serial.baud = parse_env(&name, &val, "baud rate")?;
    }

    if let Some((name, val)) = env_var("TIMING_GUARD_MS") {
        config.timing.guard_ms = parse_env(&name, &val, "duration")?;
    }
    if let Some((name, val)) = env_var("TIMING_COMMAND_MS") {
        config.timing.command_ms = parse_env(&name, &val, "duration")?;
    }
    if let Some((name, val)) = env_var("TIMING_OPEN_MS") {
        config.timing.open_ms = parse_env(&name, &val, "duration")?;
    }
    if let Some((name, val)) = env_var("TIMING_ENTRY_RETRIES") {
        config.timing.entry_retries = parse_env(&name, &val, "retry count")?;
    }

    if let Some((name, val)) = env_var("MODULE_SPACE_REPLACEMENT") {
        config.module.space_replacement = parse_env(&name, &val, "character")?;
    }
    if let Some((name, val)) = env_var("MODULE_RESTORE_HOST") {
        config.module.restore_host = parse_flag(&name, &val)?;
    }
    if let Some((name, val)) = env_var("MODULE_TRACE_RX") {
        config.module.trace_rx = parse_flag(&name, &val)?;
    }

    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }

    Ok(())
}

/// Reject settings the driver cannot work with.
fn validate(config: &Config) -> ConfigResult<()> {
    if config.serial.baud == 0 {
        return Err(ConfigError::invalid("serial.baud", "must be non-zero"));
    }
    if config.timing.command_ms == 0 {
        return Err(ConfigError::invalid("timing.command_ms", "must be non-zero"));
    }
    let replacement = config.module.space_replacement;
    if replacement.is_whitespace() || !replacement.is_ascii_graphic() {
        return Err(ConfigError::invalid(
            "module.space_replacement",
            "must be a printable, non-space ASCII character",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud, 9600);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("WIFLY_SERIAL_BAUD", "115200");
        env::set_var("WIFLY_MODULE_SPACE_REPLACEMENT", "+");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud, 115200);
        assert_eq!(loader.config().module.space_replacement, '+');

        env::remove_var("WIFLY_SERIAL_BAUD");
        env::remove_var("WIFLY_MODULE_SPACE_REPLACEMENT");
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        env::set_var("WIFLY_TIMING_COMMAND_MS", "soon");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::BadOverride { .. }));

        env::remove_var("WIFLY_TIMING_COMMAND_MS");
    }

    #[test]
    #[serial]
    fn test_flag_override() {
        env::set_var("WIFLY_MODULE_TRACE_RX", "on");
        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert!(config.module.trace_rx);
        env::remove_var("WIFLY_MODULE_TRACE_RX");

        env::set_var("WIFLY_MODULE_RESTORE_HOST", "maybe");
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "WIFLY_MODULE_RESTORE_HOST=\"maybe\" is not a valid flag"
        );
        env::remove_var("WIFLY_MODULE_RESTORE_HOST");
    }

    #[test]
    fn test_save_without_path() {
        let loader = ConfigLoader::with_defaults();
        assert!(matches!(loader.save(), Err(ConfigError::NoPath)));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(validate(&config).is_ok());

        config.module.space_replacement = ' ';
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }
}
