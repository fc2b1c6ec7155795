//! Headless Blender invocation.
//!
//! Every call writes a helper script to a temporary file, runs
//! `blender --background --python <script> -- <file>`, and reads the JSON
//! report from stdout. The child runs on a private current-thread tokio
//! runtime so a timeout can kill it; the script file is removed when the
//! call returns, whatever the outcome.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use bd_core::SceneMetadata;
use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::SceneExtractor;
use crate::error::SceneError;
use crate::script::{DEPENDENCIES_SCRIPT, DependencyReport, METADATA_SCRIPT, parse_report};

/// Executable names searched on `PATH`.
const EXECUTABLE_NAMES: &[&str] = &["blender", "blender.exe"];

/// Default limit for a single invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Scene extractor backed by a Blender executable.
#[derive(Debug)]
pub struct BlenderTool {
    executable: Utf8PathBuf,
    timeout: Duration,
    runtime: Runtime,
}

impl BlenderTool {
    /// Creates a tool for a known executable.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Io`] if the subprocess runtime cannot be built.
    pub fn new(executable: impl Into<Utf8PathBuf>, timeout: Duration) -> Result<Self, SceneError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            executable: executable.into(),
            timeout,
            runtime,
        })
    }

    /// Finds the executable and creates a tool for it.
    ///
    /// An `explicit` path must point at an existing file. Otherwise `PATH` is
    /// searched for `blender` and then `blender.exe`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ToolUnavailable`] if no executable is found.
    pub fn locate(explicit: Option<&Utf8Path>, timeout: Duration) -> Result<Self, SceneError> {
        let executable = match explicit {
            Some(path) if path.is_file() => path.to_owned(),
            Some(path) => {
                return Err(SceneError::ToolUnavailable {
                    reason: format!("{path} is not a file"),
                });
            }
            None => search_path()?,
        };
        debug!(%executable, ?timeout, "Using scene tool");
        Self::new(executable, timeout)
    }

    /// Returns the executable in use.
    #[inline]
    #[must_use]
    pub fn executable(&self) -> &Utf8Path {
        &self.executable
    }

    /// Returns the per-invocation timeout.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Reads scene statistics from `path`.
    ///
    /// A script-side error while opening the file is kept in
    /// [`SceneMetadata::error`] with zero counts.
    pub fn try_extract_metadata(&self, path: &Utf8Path) -> Result<SceneMetadata, SceneError> {
        let stdout = self.run_script(METADATA_SCRIPT, path)?;
        parse_report(&stdout, path)
    }

    /// Lists the files referenced by `path`.
    ///
    /// Relative references (Blender's `//` prefix included) are resolved
    /// against the folder holding `path`.
    pub fn try_extract_dependencies(&self, path: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SceneError> {
        let stdout = self.run_script(DEPENDENCIES_SCRIPT, path)?;
        let report: DependencyReport = parse_report(&stdout, path)?;
        if let Some(message) = report.error {
            return Err(SceneError::Script {
                path: path.to_owned(),
                message,
            });
        }

        let base = path.parent().unwrap_or(Utf8Path::new(""));
        Ok(report
            .external_files
            .iter()
            .map(|file| resolve_reference(base, file))
            .collect())
    }

    fn run_script(&self, script: &str, path: &Utf8Path) -> Result<String, SceneError> {
        let mut script_file = tempfile::Builder::new()
            .prefix("blendoc-")
            .suffix(".py")
            .tempfile()?;
        script_file.write_all(script.as_bytes())?;
        script_file.flush()?;

        let mut command = Command::new(self.executable.as_std_path());
        command
            .arg("--background")
            .arg("--python")
            .arg(script_file.path())
            .arg("--")
            .arg(path.as_std_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = self.runtime.block_on(async {
            let child = command.spawn().map_err(|source| SceneError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;
            // Dropping the wait future on timeout drops the child, which kills it.
            match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(result) => result.map_err(SceneError::Io),
                Err(_) => Err(SceneError::Timeout {
                    path: path.to_owned(),
                    after: self.timeout,
                }),
            }
        })?;

        if !output.status.success() {
            debug!(%path, status = %output.status, "Scene tool exited unsuccessfully");
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SceneExtractor for BlenderTool {
    fn extract_metadata(&self, path: &Utf8Path) -> SceneMetadata {
        match self.try_extract_metadata(path) {
            Ok(meta) => {
                if let Some(error) = &meta.error {
                    warn!(%path, %error, "Scene tool could not open file");
                }
                meta
            }
            Err(err) => {
                warn!(%path, error = %err, "Failed to extract scene metadata");
                SceneMetadata::default()
            }
        }
    }

    fn extract_dependencies(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        self.try_extract_dependencies(path).unwrap_or_else(|err| {
            warn!(%path, error = %err, "Failed to extract scene dependencies");
            Vec::new()
        })
    }
}

fn search_path() -> Result<Utf8PathBuf, SceneError> {
    for name in EXECUTABLE_NAMES {
        if let Ok(found) = which::which(name) {
            return Utf8PathBuf::from_path_buf(found).map_err(|p| SceneError::ToolUnavailable {
                reason: format!("{} is not valid UTF-8", p.display()),
            });
        }
    }
    Err(SceneError::ToolUnavailable {
        reason: format!("none of {EXECUTABLE_NAMES:?} on PATH"),
    })
}

fn resolve_reference(base: &Utf8Path, reference: &str) -> Utf8PathBuf {
    let reference = reference.strip_prefix("//").unwrap_or(reference);
    let path = Utf8Path::new(reference);
    if path.is_absolute() {
        path.to_owned()
    } else {
        base.join(path)
    }
}
