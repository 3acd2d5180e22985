//! Configuration management for serial-exec.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::execution::ExecutorOptions;
use crate::stream::DEFAULT_MAX_LINE_LENGTH;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device settings.
    pub serial: SerialSection,
    /// Login and command execution settings.
    pub execution: ExecutionSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Serial device section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSection {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// Line speed in baud.
    pub baud_rate: u32,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            path: String::new(),
            baud_rate: 115_200,
        }
    }
}

/// Execution section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Command deadline in milliseconds.
    pub timeout_ms: u64,
    /// Prompt polling attempts during login.
    pub init_attempts: u32,
    /// Delay between prompt polls in milliseconds.
    pub init_interval_ms: u64,
    /// Remove escape sequences from console text.
    pub strip_ansi: bool,
    /// Longest unterminated console line kept in memory.
    pub max_line_length: usize,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            init_attempts: 10,
            init_interval_ms: 1_000,
            strip_ansi: true,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable numbers are ignored and the previous value kept.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SERIAL_EXEC_DEVICE") {
            if !path.is_empty() {
                self.serial.path = path;
            }
        }

        if let Some(baud) = lookup("SERIAL_EXEC_BAUD") {
            if let Ok(baud) = baud.parse() {
                self.serial.baud_rate = baud;
            }
        }

        if let Some(timeout) = lookup("SERIAL_EXEC_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                self.execution.timeout_ms = timeout;
            }
        }

        if let Some(level) = lookup("SERIAL_EXEC_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref device) = args.device {
            self.serial.path = device.clone();
        }

        if let Some(baud) = args.baud_rate {
            self.serial.baud_rate = baud;
        }

        if let Some(timeout) = args.timeout_ms {
            self.execution.timeout_ms = timeout;
        }

        if args.no_strip_ansi {
            self.execution.strip_ansi = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Check the settings needed to open a console.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.path.is_empty() {
            return Err(ConfigError::MissingDevice);
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate(self.serial.baud_rate));
        }
        Ok(())
    }

    /// Convert to options for the executor.
    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            timeout: Duration::from_millis(self.execution.timeout_ms),
            init_attempts: self.execution.init_attempts,
            init_interval: Duration::from_millis(self.execution.init_interval_ms),
            strip_ansi: self.execution.strip_ansi,
            max_line_length: self.execution.max_line_length,
            ..ExecutorOptions::default()
        }
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// No serial device was given anywhere.
    MissingDevice,
    /// Baud rate the port cannot be opened with.
    InvalidBaudRate(u32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::MissingDevice => write!(
                f,
                "no serial device given (use --device or SERIAL_EXEC_DEVICE)"
            ),
            Self::InvalidBaudRate(baud) => write!(f, "invalid baud rate: {}", baud),
        }
    }
}

impl std::error::Error for ConfigError {}
