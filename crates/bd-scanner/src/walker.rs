//! Directory traversal for project files.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to walk
//! a project folder. Version-control metadata, caches, and virtual
//! environments are pruned by name; dotfiles are skipped. Unlike a source
//! tree walk, `.gitignore` rules are not honoured, since ignored renders and
//! caches are still project assets.
//!
//! # Examples
//!
//! ```
//! use bd_scanner::FileWalker;
//! use camino::Utf8Path;
//!
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("scene.blend"), b"BLENDER")?;
//! std::fs::write(dir.path().join(".DS_Store"), b"")?;
//!
//! let root = Utf8Path::from_path(dir.path()).unwrap();
//! let output = FileWalker::new(root)?.collect_paths();
//! assert_eq!(output.paths.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use bd_core::ConfigError;
use bd_core::config::DEFAULT_SKIP_NAMES;
use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::warn;

use crate::error::ScanError;

/// Files found by a walk, and the entries that could not be read.
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Regular files, in walk order.
    pub paths: Vec<Utf8PathBuf>,
    /// Non-fatal errors for entries that were skipped.
    pub errors: Vec<ScanError>,
}

/// A file walker that discovers every file of a project folder.
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// File and directory names never visited.
    skip_names: Vec<String>,
    /// Whether to descend into subdirectories.
    recursive: bool,
}

impl FileWalker {
    /// Creates a recursive walker for `root` with the default skip names.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root path doesn't exist or
    /// isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ConfigError::MissingDirectory(root.to_owned()).into());
        }
        if !root.is_dir() {
            return Err(ConfigError::InvalidPath {
                path: root.to_owned(),
                reason: "not a directory".to_owned(),
            }
            .into());
        }

        Ok(Self {
            root: root.to_owned(),
            skip_names: DEFAULT_SKIP_NAMES.iter().map(ToString::to_string).collect(),
            recursive: true,
        })
    }

    /// Replaces the set of skipped names.
    #[must_use]
    pub fn with_skip_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.skip_names = names.iter().map(|n| n.as_ref().to_owned()).collect();
        self
    }

    /// Configures whether to descend into subdirectories.
    ///
    /// A non-recursive walk only lists the files directly inside the root.
    #[must_use]
    pub const fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Collects all file paths below the root.
    ///
    /// Unreadable entries and non-UTF-8 paths are logged and returned in
    /// [`WalkOutput::errors`]; they never stop the walk.
    pub fn collect_paths(&self) -> WalkOutput {
        let mut output = WalkOutput::default();

        for result in self.build_walker() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable entry");
                    output.errors.push(err.into());
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Some(path) = Utf8Path::from_path(entry.path()) else {
                warn!(path = %entry.path().display(), "Skipping non UTF-8 path");
                output.errors.push(ScanError::NonUtf8Path(entry.path().to_owned()));
                continue;
            };

            if path.file_name().is_some_and(is_dotfile) {
                continue;
            }

            output.paths.push(path.to_owned());
        }

        output
    }

    fn build_walker(&self) -> ignore::Walk {
        let skip_names = self.skip_names.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            // Every file is a potential asset; no ignore files.
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || entry
                        .file_name()
                        .to_str()
                        .is_none_or(|name| !skip_names.iter().any(|s| s == name))
            });
        if !self.recursive {
            builder.max_depth(Some(1));
        }
        builder.build()
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

fn is_dotfile(name: &str) -> bool {
    name.starts_with('.')
}
