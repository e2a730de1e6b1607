//! Error types for configuration decoding, encoding and persistence
//!
//! Every failure the crate can produce is a distinct [`ConfigError`] variant so
//! callers can tell a missing file on first run apart from a wrong key or a
//! corrupt payload.

use std::path::{Path, PathBuf};

/// Errors raised while loading, saving, restoring or converting configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist
    #[error("Configuration not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// File extension or declared format is not JSON or TOML
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// The format parser rejected the content
    #[error("{format} parsing error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// A mapping key was not a string
    #[error("Invalid mapping key: {0}")]
    InvalidKeyKind(String),

    /// The format serializer rejected the tree (e.g. null in TOML)
    #[error("{format} serialization error: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },

    /// The secret key is missing or malformed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Authentication failed: wrong key or tampered data
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Filesystem read or write failure
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a not found error for a path
    pub fn not_found<P: AsRef<Path>>(path: P) -> Self {
        Self::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format<S: Into<String>>(what: S) -> Self {
        Self::UnsupportedFormat(what.into())
    }

    /// Create a parse error for the named format
    pub fn parse<S: ToString>(format: &'static str, err: S) -> Self {
        Self::Parse {
            format,
            message: err.to_string(),
        }
    }

    /// Create an invalid key kind error
    pub fn invalid_key_kind<S: Into<String>>(msg: S) -> Self {
        Self::InvalidKeyKind(msg.into())
    }

    /// Create a serialization error for the named format
    pub fn serialize<S: ToString>(format: &'static str, err: S) -> Self {
        Self::Serialize {
            format,
            message: err.to_string(),
        }
    }

    /// Create an encryption error with context
    pub fn encryption<S: Into<String>>(msg: S) -> Self {
        Self::Encryption(msg.into())
    }

    /// Create a decryption error with context
    pub fn decryption<S: Into<String>>(msg: S) -> Self {
        Self::Decryption(msg.into())
    }

    /// Wrap an IO error with the path it occurred on.
    ///
    /// `NotFound` IO errors become [`ConfigError::NotFound`].
    pub fn io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(path);
        }
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True when the configuration simply does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }

    /// Check if the caller can recover by falling back to defaults
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConfigError::NotFound { .. } => true,
            ConfigError::UnsupportedFormat(_) => false,
            ConfigError::Parse { .. } => false,
            ConfigError::InvalidKeyKind(_) => false,
            ConfigError::Serialize { .. } => false,
            ConfigError::Encryption(_) => false,
            ConfigError::Decryption(_) => false,
            ConfigError::Io { .. } => false,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::NotFound { path } => {
                format!("No configuration at {} yet", path.display())
            }
            ConfigError::UnsupportedFormat(what) => {
                format!("Only JSON and TOML configuration is supported, got {}", what)
            }
            ConfigError::Parse { format, message } => {
                format!("Configuration file is not valid {}: {}", format, message)
            }
            ConfigError::InvalidKeyKind(msg) => {
                format!("Configuration keys must be strings: {}", msg)
            }
            ConfigError::Serialize { format, message } => {
                format!("Configuration cannot be written as {}: {}", format, message)
            }
            ConfigError::Encryption(msg) => format!("Secret key is not usable: {}", msg),
            ConfigError::Decryption(msg) => {
                format!("Wrong secret key or tampered configuration: {}", msg)
            }
            ConfigError::Io { path, source } => {
                format!("Failed to access {}: {}", path.display(), source)
            }
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
