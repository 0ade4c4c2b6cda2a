//! Application configuration loading, validation, and management.
//!
//! The top-level `Config` aggregates the logging, publisher, and transport
//! sections. It is loaded from a TOML file early in the application
//! lifecycle and stays immutable afterwards. The minimal deployment needs
//! no configuration surface at all, so a missing file is not an error: the
//! built-in defaults (topic `chatter`, 500 ms period, queue depth 10)
//! describe a complete working process.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::{logger::LoggerConfig, publisher::PublisherConfig};

pub mod logger;
pub mod publisher;

/// UTC timestamp for the pre-subscriber print macros.
#[doc(hidden)]
pub fn timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Simple macros for printing timestamped messages before the tracing
/// subscriber is initialized. Used during early configuration loading.
#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style($crate::config::timestamp()).dim(),
            console::style("INFO").green(),
            format_args!($($arg)*)
        );
    };
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style($crate::config::timestamp()).dim(),
            console::style("WARN").yellow(),
            format_args!($($arg)*)
        );
    };
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style($crate::config::timestamp()).dim(),
            console::style("ERROR").red(),
            format_args!($($arg)*)
        );
    };
}

/// Errors that can occur during configuration loading, parsing, or
/// validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Generic configuration-related error with a descriptive message.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while accessing configuration files.
    #[error("IO error while reading configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// Failure to parse the TOML configuration file.
    #[error("Parse error while reading configuration: {0}")]
    ParseError(String),

    /// Validation failure after successful parsing.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Transport-layer configuration (broker address, session settings).
pub type TransportConfig = chatterd_mqtt::Config;

/// Top-level application configuration.
#[derive(Serialize, Deserialize, Debug, Validate, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Logging subsystem configuration.
    #[validate(nested)]
    pub logger: LoggerConfig,

    /// Periodic publisher configuration (topic, cadence, queue depth).
    #[validate(nested)]
    pub publisher: PublisherConfig,

    /// MQTT transport configuration.
    #[validate(nested)]
    pub transport: TransportConfig,
}

impl Config {
    /// Constructs the configuration by locating and loading the config
    /// file, falling back to built-in defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a configuration file was found (or named
    /// via the environment) but cannot be read, parsed, or validated.
    pub fn new() -> Result<Self, ConfigError> {
        match Self::get_config_path() {
            Some(config_path) => Self::load(&config_path),
            None => {
                print_info!("No configuration file found, using built-in defaults");
                Ok(Config::default())
            }
        }
    }

    /// Determines the configuration file path.
    ///
    /// Priority:
    /// 1. `CHATTERD_CONFIG` environment variable
    /// 2. `/etc/chatterd/config.toml`, if it exists
    fn get_config_path() -> Option<PathBuf> {
        if let Ok(config_path) = std::env::var("CHATTERD_CONFIG") {
            let path = PathBuf::from(config_path);
            print_info!("Using config from CHATTERD_CONFIG: {}", path.display());
            return Some(path);
        }

        let fallback = Path::new("/etc/chatterd/config.toml");
        if fallback.exists() {
            print_info!("Using default config path: {}", fallback.display());
            return Some(fallback.to_path_buf());
        }

        None
    }

    /// Loads and validates configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Propagates IO, parsing, and validation errors as `ConfigError`.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        print_info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::Config(format!(
                "Configuration file does not exist: {}",
                path.display()
            )));
        }

        let config_str = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&config_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        print_info!("Successfully loaded config from: {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.publisher.topic, "chatter");
        assert_eq!(config.publisher.period_ms, 500);
        assert_eq!(config.publisher.queue_depth, 10);
    }

    #[test]
    fn load_reads_partial_file_over_defaults() {
        let file = write_config(
            r#"
            [publisher]
            topic = "announcements"
            period_ms = 250

            [transport]
            host = "broker.local"
            "#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.publisher.topic, "announcements");
        assert_eq!(config.publisher.period_ms, 250);
        // Untouched sections keep their defaults
        assert_eq!(config.publisher.queue_depth, 10);
        assert_eq!(config.transport.host, "broker.local");
        assert_eq!(config.logger.level, "info");
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let file = write_config("publisher = not valid toml [");
        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let file = write_config(
            r#"
            [publisher]
            topic = ""
            "#,
        );
        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let result = Config::load(Path::new("/nonexistent/chatterd/config.toml"));
        assert!(matches!(result, Err(ConfigError::Config(_))));
    }
}
