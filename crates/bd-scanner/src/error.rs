//! Error types for the bd-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! while walking a project and resolving its dependencies.

use bd_core::ConfigError;
use camino::Utf8PathBuf;

/// Errors that can occur during scanning and traversal.
///
/// # Error Recovery Strategy
///
/// - **Configuration errors** ([`ScanError::Config`]): Fatal - the scan does not start
/// - **Walker errors** ([`ScanError::Walk`]): Log warning, skip the entry, continue
/// - **Access errors** ([`ScanError::Access`]): Log warning, drop the path, continue
/// - **Rejected links** ([`ScanError::CycleRejected`]): Recorded, traversal continues
///
/// # Examples
///
/// ```
/// use bd_core::ConfigError;
/// use bd_scanner::ScanError;
///
/// fn describe(err: &ScanError) -> &'static str {
///     match err {
///         ScanError::Walk(_) => "walk",
///         ScanError::Access { .. } => "access",
///         ScanError::CycleRejected { .. } => "cycle",
///         ScanError::Config(_) => "config",
///         ScanError::NonUtf8Path(_) => "encoding",
///     }
/// }
///
/// let missing = ConfigError::MissingDirectory("/no/root".into());
/// assert_eq!(describe(&missing.into()), "config");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to read a directory entry while walking.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to stat or read a file.
    #[error("failed to access {path}: {source}")]
    Access {
        /// The path that couldn't be accessed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A dependency link was refused because it would close a cycle.
    #[error("link {from} -> {to} would create a cycle")]
    CycleRejected {
        /// The file declaring the dependency.
        from: Utf8PathBuf,
        /// The dependency that was not linked.
        to: Utf8PathBuf,
    },

    /// Invalid scan configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl ScanError {
    /// Creates a new [`ScanError::Access`] error.
    #[inline]
    pub fn access(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Access {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if scanning can continue after this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Returns `true` if the scan cannot start.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Access { path, .. } => Some(path),
            Self::CycleRejected { from, .. } => Some(from),
            Self::Walk(_) | Self::Config(_) | Self::NonUtf8Path(_) => None,
        }
    }
}
