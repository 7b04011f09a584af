//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort {
        /// The rejected value.
        value: String,
    },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        /// The rejected value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        /// The rejected value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric variable holds a non-numeric or non-positive value.
    #[error("invalid value for {name}: '{value}'")]
    InvalidNumber {
        /// Environment variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Similarity threshold must land in [0, 1].
    #[error("invalid similarity threshold '{value}': must be within [0, 1]")]
    InvalidThreshold {
        /// The rejected value.
        value: f32,
    },

    /// Embedding dimension must be non-zero.
    #[error("invalid embedding dimension '{value}': must be greater than 0")]
    InvalidDimension {
        /// The rejected value.
        value: usize,
    },
}
