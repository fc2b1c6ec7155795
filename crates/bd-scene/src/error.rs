//! Error types for the bd-scene crate.

use std::time::Duration;

use camino::Utf8PathBuf;

/// Errors raised while running the scene tool.
///
/// None of these stop a project scan. [`SceneError::ToolUnavailable`] puts
/// the scan into degraded mode; every other variant is logged and the
/// affected call yields its default result.
///
/// # Examples
///
/// ```
/// use bd_scene::SceneError;
/// use std::time::Duration;
///
/// let err = SceneError::Timeout { path: "/p/a.blend".into(), after: Duration::from_secs(2) };
/// assert!(err.to_string().contains("/p/a.blend"));
/// assert_eq!(err.path().map(|p| p.as_str()), Some("/p/a.blend"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// No scene tool executable could be found.
    #[error("blender executable not found; install Blender or pass --blender-path ({reason})")]
    ToolUnavailable {
        /// What was searched.
        reason: String,
    },

    /// The tool process could not be started.
    #[error("failed to start {executable}: {source}")]
    Spawn {
        /// The executable that failed to start.
        executable: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tool did not finish in time and was killed.
    #[error("scene tool timed out after {after:?} on {path}")]
    Timeout {
        /// The scene file being inspected.
        path: Utf8PathBuf,
        /// The configured limit.
        after: Duration,
    },

    /// The tool output did not contain a readable report.
    #[error("unreadable scene tool output for {path}: {reason}")]
    Protocol {
        /// The scene file being inspected.
        path: Utf8PathBuf,
        /// What was wrong with the output.
        reason: String,
    },

    /// The helper script reported an error while opening the file.
    #[error("scene tool could not open {path}: {message}")]
    Script {
        /// The scene file being inspected.
        path: Utf8PathBuf,
        /// Message printed by the script.
        message: String,
    },

    /// A local I/O operation failed (temporary script, runtime setup).
    #[error("scene tool I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Creates a [`SceneError::Protocol`] error.
    pub fn protocol(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the scene file associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Timeout { path, .. } | Self::Protocol { path, .. } | Self::Script { path, .. } => {
                Some(path)
            }
            Self::ToolUnavailable { .. } | Self::Spawn { .. } | Self::Io(_) => None,
        }
    }
}
