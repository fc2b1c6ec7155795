//! Configuration structures for blendoc.
//!
//! - [`ScanConfig`] - Project folder, recursion, and traversal gating
//! - [`SceneConfig`] - Scene tool location and timeout
//! - [`ReportConfig`] - Default graph mode and output format
//! - [`Config`] - Root configuration combining all settings
//!
//! Every struct is `#[serde(default)]`, so a configuration file only needs to
//! name the options it changes.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Names skipped while walking a project folder.
pub const DEFAULT_SKIP_NAMES: &[&str] = &[
    ".git",
    ".gitignore",
    "__pycache__",
    ".DS_Store",
    "thumbs.db",
    ".pytest_cache",
    ".venv",
    "venv",
    "node_modules",
];

/// Default limit for a single scene tool invocation.
pub const DEFAULT_SCENE_TIMEOUT_SECS: u64 = 120;

/// Node granularity of the dependency graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphMode {
    /// One node per folder; links between files are aggregated.
    #[default]
    Folder,
    /// One node per file.
    File,
}

/// Output format for graph exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Graphviz DOT.
    #[default]
    Dot,
    /// JSON node/edge lists.
    Json,
}

/// Configuration for project scanning and traversal.
///
/// # Examples
///
/// ```
/// use bd_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.recursive);
/// assert!(!config.follow_external);
/// assert!(config.skip_names.iter().any(|n| n == "node_modules"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Project folder to scan.
    pub root_path: Utf8PathBuf,

    /// Whether to descend into subfolders.
    pub recursive: bool,

    /// Whether to add and expand files referenced from outside the project folder.
    pub follow_external: bool,

    /// File and folder names never visited.
    pub skip_names: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: Utf8PathBuf::new(),
            recursive: true,
            follow_external: false,
            skip_names: DEFAULT_SKIP_NAMES.iter().map(|&n| n.to_owned()).collect(),
        }
    }
}

/// Configuration for the external scene tool.
///
/// # Examples
///
/// ```
/// use bd_core::SceneConfig;
/// use std::time::Duration;
///
/// let config = SceneConfig::default();
/// assert!(config.blender_path.is_none());
/// assert_eq!(config.timeout(), Duration::from_secs(120));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Explicit executable; `None` searches `PATH`.
    pub blender_path: Option<Utf8PathBuf>,

    /// Seconds before a tool invocation is killed.
    pub timeout_secs: u64,
}

impl SceneConfig {
    /// Returns the invocation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            blender_path: None,
            timeout_secs: DEFAULT_SCENE_TIMEOUT_SECS,
        }
    }
}

/// Defaults for report generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Graph granularity.
    pub graph_mode: GraphMode,

    /// Graph export format.
    pub format: ReportFormat,
}

/// Root configuration for blendoc.
///
/// # Examples
///
/// ```
/// use bd_core::{Config, GraphMode};
///
/// let config: Config = serde_json::from_str(r#"{"report": {"graph_mode": "file"}}"#).unwrap();
/// assert_eq!(config.report.graph_mode, GraphMode::File);
/// assert_eq!(config.scene.timeout_secs, 120);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner configuration.
    pub scan: ScanConfig,

    /// Scene tool configuration.
    pub scene: SceneConfig,

    /// Report configuration.
    pub report: ReportConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid configuration JSON.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Checks option values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for a zero scene timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scene.timeout_secs == 0 {
            return Err(ConfigError::invalid_option(
                "scene.timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Checks that `scan.root_path` names an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDirectory`] if nothing exists at the
    /// root path and [`ConfigError::InvalidPath`] if it is not a directory.
    pub fn validate_root(&self) -> Result<(), ConfigError> {
        let root = &self.scan.root_path;
        if !root.exists() {
            return Err(ConfigError::MissingDirectory(root.clone()));
        }
        if !root.is_dir() {
            return Err(ConfigError::InvalidPath {
                path: root.clone(),
                reason: "not a directory".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_scan_config_defaults() {
        let config = ScanConfig::default();
        assert!(config.recursive);
        assert!(!config.follow_external);
        assert_eq!(config.skip_names.len(), DEFAULT_SKIP_NAMES.len());
        assert!(config.root_path.as_str().is_empty());
    }

    #[test]
    fn test_scene_config_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.timeout_secs, 120);
        assert!(config.blender_path.is_none());
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"scan": {"follow_external": true}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.scan.follow_external);
        // Other fields should have defaults
        assert!(config.scan.recursive);
        assert_eq!(config.scene.timeout_secs, 120);
        assert_eq!(config.report.format, ReportFormat::Dot);
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&GraphMode::Folder).unwrap(), r#""folder""#);
        assert_eq!(serde_json::to_string(&GraphMode::File).unwrap(), r#""file""#);
        assert_eq!(serde_json::to_string(&ReportFormat::Json).unwrap(), r#""json""#);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scene": {{"timeout_secs": 5, "blender_path": "/opt/blender"}}}}"#)
            .unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        let config = Config::from_file(path).unwrap();
        assert_eq!(config.scene.timeout_secs, 5);
        assert_eq!(config.scene.blender_path.as_deref(), Some(Utf8Path::new("/opt/blender")));
    }

    #[test]
    fn test_from_file_errors() {
        let missing = Config::from_file(Utf8Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();
        assert!(matches!(Config::from_file(path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.scene.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidOption { .. })));
    }

    #[test]
    fn test_validate_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.scan.root_path = Utf8Path::from_path(dir.path()).unwrap().to_owned();
        assert!(config.validate_root().is_ok());

        config.scan.root_path = config.scan.root_path.join("missing");
        assert!(matches!(
            config.validate_root(),
            Err(ConfigError::MissingDirectory(path)) if path.ends_with("missing")
        ));

        let file = tempfile::NamedTempFile::new().unwrap();
        config.scan.root_path = Utf8Path::from_path(file.path()).unwrap().to_owned();
        assert!(matches!(config.validate_root(), Err(ConfigError::InvalidPath { .. })));
    }
}
