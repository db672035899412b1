//! # Error Types
//!
//! Custom error types for Joy Teleop using `thiserror`.

use thiserror::Error;

/// Main error type for Joy Teleop
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Joystick device errors
    #[error("Joystick error: {0}")]
    Device(String),

    /// No usable joystick found under /dev/input
    #[error("No joystick device found")]
    DeviceNotFound,

    /// Serial link errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// Command or frame encoding errors
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TeleopError {
    /// Builds a [`TeleopError::Config`] from a plain message.
    pub fn config(msg: impl std::fmt::Display) -> Self {
        use serde::de::Error;
        TeleopError::Config(toml::de::Error::custom(msg))
    }
}

/// Result type alias for Joy Teleop
pub type Result<T> = std::result::Result<T, TeleopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = TeleopError::config("min_scale must be positive");
        let msg = err.to_string();
        assert!(msg.starts_with("Configuration error"));
        assert!(msg.contains("min_scale must be positive"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TeleopError = io.into();
        assert!(matches!(err, TeleopError::Io(_)));
    }
}
