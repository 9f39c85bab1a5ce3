//! Core error types for chimeclock-core.
//!
//! Every failure the clock can hit is one of these. None of them is fatal:
//! the controller turns tone and alarm-input errors into status messages,
//! and only configuration/IO errors reach the CLI's exit path.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for chimeclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Audio output errors
    #[error("Tone error: {0}")]
    Tone(#[from] ToneError),

    /// Rejected alarm time input
    #[error("Alarm input error: {0}")]
    AlarmInput(#[from] AlarmInputError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tone engine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToneError {
    /// A tone was requested before audio was enabled.
    #[error("audio is not enabled")]
    NotEnabled,

    /// No usable audio output on this platform. The engine stays disabled.
    #[error("audio output not supported: {0}")]
    Unsupported(String),
}

/// Alarm time input errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlarmInputError {
    /// Nothing was entered.
    #[error("no alarm time given")]
    Empty,

    /// Input is not a valid `HH:MM` time of day.
    #[error("invalid alarm time '{0}', expected HH:MM")]
    Malformed(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_error_wraps_into_core_error() {
        let err: CoreError = ToneError::NotEnabled.into();
        assert_eq!(err.to_string(), "Tone error: audio is not enabled");
    }

    #[test]
    fn malformed_input_names_the_value() {
        let err = AlarmInputError::Malformed("25:99".into());
        assert_eq!(err.to_string(), "invalid alarm time '25:99', expected HH:MM");
    }
}
