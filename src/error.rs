//! Error types for openwrt-cache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for openwrt-cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in openwrt-cache
#[derive(Error, Debug)]
pub enum CacheError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Build directory not accessible: {path}: {reason}")]
    PrefixNotFound { path: PathBuf, reason: String },

    #[error("Failed to read cache state from {path}: {reason}")]
    StateRead { path: PathBuf, reason: String },

    // Toolchain hash errors
    #[error("Failed to resolve toolchain hash: {0}")]
    HashResolution(String),

    // Blob store errors
    #[error("Cache store error: {0}")]
    Store(String),

    #[error("Cache entry already exists: {0}")]
    KeyExists(String),

    #[error("No files matched the cache paths: {0}")]
    NothingToSave(String),

    #[error("Cache index corrupt at {path}: {reason}")]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("Invalid cache path pattern: {0}")]
    Glob(#[from] globset::Error),

    // Build system errors
    #[error("Failed to patch {path}: {reason}")]
    Patch { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a store error from any displayable cause
    pub fn store(reason: impl std::fmt::Display) -> Self {
        Self::Store(reason.to_string())
    }

    /// Whether this error comes from the blob store rather than local setup
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::KeyExists(_) | Self::NothingToSave(_) | Self::IndexCorrupt { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PrefixNotFound { .. } => Some("Check the prefix input points at the OpenWrt source tree"),
            Self::HashResolution(_) => {
                Some("Run inside a git checkout with history for tools/ and toolchain/, or pass --toolchain false")
            }
            Self::IndexCorrupt { .. } => Some("Remove the store's index.json to start from an empty cache"),
            Self::KeyExists(_) => Some("Another run already saved this key; enable ccache for per-run keys"),
            _ => None,
        }
    }
}
