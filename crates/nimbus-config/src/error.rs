//! Error types for voicing files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving a voicing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A numeric field was NaN or infinite
    #[error("field '{field}' must be finite, got {value}")]
    NonFinite {
        /// Dotted path of the offending field.
        field: String,
        /// The rejected value.
        value: f32,
    },

    /// Too many delay times for the tank
    #[error("{count} delay times given, at most {max} lines are supported")]
    TooManyLines {
        /// Number of delay times in the file.
        count: usize,
        /// Tank line limit.
        max: usize,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a non-finite field error.
    pub fn non_finite(field: impl Into<String>, value: f32) -> Self {
        ConfigError::NonFinite {
            field: field.into(),
            value,
        }
    }
}
