//! # Error Types
//!
//! Custom error types for the Vallox RS485 driver using `thiserror`.
//!
//! Only construction-time failures and fatal transport failures are errors.
//! Checksum mismatches, rejected register values and disallowed writes are
//! expected bus conditions and never surface as a [`ValloxError`].

use thiserror::Error;

/// Main error type for the Vallox RS485 driver
#[derive(Debug, Error)]
pub enum ValloxError {
    /// Local bus address outside the remote client range
    #[error("Invalid remote client id 0x{0:02x}: must be within 0x20..=0x2f")]
    InvalidRemoteClientId(u8),

    /// Serial port could not be opened
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the Vallox RS485 driver
pub type Result<T> = std::result::Result<T, ValloxError>;
