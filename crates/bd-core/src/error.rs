//! Error types for the bd-core crate.
//!
//! This module provides the [`ConfigError`] type for failures while loading
//! or validating configuration.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use bd_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingDirectory(Utf8PathBuf::from("/some/project"));
/// assert!(error.to_string().contains("/some/project"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The provided path is invalid or malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path.
        path: Utf8PathBuf,
        /// Explanation of why the path is invalid.
        reason: String,
    },

    /// The project folder does not exist.
    #[error("missing required directory: {0}")]
    MissingDirectory(Utf8PathBuf),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates an [`ConfigError::InvalidOption`] error.
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}
