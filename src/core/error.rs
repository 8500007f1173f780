//! Error types for core module
//!
//! Provides custom error types for core functionality: settings persistence
//! and configuration validation.

use thiserror::Error;

/// Errors that can occur in the core module
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings file I/O error
    #[error("Settings I/O error: {0}")]
    SettingsIo(#[from] std::io::Error),

    /// Settings serialization/deserialization error
    #[error("Settings serialization error: {0}")]
    SettingsSerialization(#[from] serde_json::Error),

    /// No platform configuration directory could be resolved
    #[error("No configuration directory available")]
    NoConfigDir,

    /// A setting holds a value that cannot be used
    #[error("Invalid setting `{key}`: {message}")]
    InvalidSetting { key: &'static str, message: String },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
