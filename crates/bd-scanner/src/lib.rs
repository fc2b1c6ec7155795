//! Project discovery and dependency traversal for blendoc.
//!
//! This crate turns a project folder into a populated
//! [`MetadataStore`] and [`LinkRegistry`].
//!
//! # Overview
//!
//! The main entry point is [`ProjectScanner`], which combines:
//!
//! - [`FileWalker`]: Directory traversal with the fixed skip set
//! - [`file_type_for`]: Extension or content-sniffed file types
//! - [`MetadataExtractor`]: Header-level metadata for leaf files
//! - [`FileProcessor`]: Breadth-first worklist expansion of scene dependencies
//! - [`ProcessStats`]: Counters for the traversal
//!
//! # Example
//!
//! ```no_run
//! use bd_core::Config;
//! use bd_scanner::ProjectScanner;
//!
//! let mut config = Config::default();
//! config.scan.root_path = "./my-film".into();
//!
//! let scanner = ProjectScanner::new(config)?;
//! let result = scanner.scan()?;
//! println!("{} files, {} links", result.store.len(), result.links.link_count());
//! # Ok::<(), bd_scanner::ScanError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ProjectScanner
//!     │
//!     ├── FileWalker (collect paths)
//!     │       └── WalkBuilder (ignore crate)
//!     │
//!     ├── MetadataStore + Worklist (seeded in walk order)
//!     │
//!     ├── BlenderTool (located on PATH, optional)
//!     │
//!     └── FileProcessor (drains the worklist)
//!             ├── MetadataExtractor (leaf / unknown files)
//!             └── SceneExtractor + LinkRegistry (containers)
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod classify;
mod error;
mod extractor;
mod processor;
mod stats;
mod walker;

pub use classify::{entry_for_path, file_type_for};
pub use error::ScanError;
pub use extractor::MetadataExtractor;
pub use processor::{FileProcessor, ProcessResult};
pub use stats::ProcessStats;
pub use walker::{FileWalker, WalkOutput};

use bd_core::{Config, ConfigError, EntryId, LinkRegistry, MetadataStore, Worklist};
use bd_scene::{BlenderTool, SceneExtractor};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

/// Result of a complete project scan.
#[derive(Debug)]
pub struct ScanResult {
    /// Every discovered file, indexed.
    pub store: MetadataStore,
    /// Accepted dependency links.
    pub links: LinkRegistry,
    /// Processed entries in completion order.
    pub processed: Vec<EntryId>,
    /// Traversal counters.
    pub stats: ProcessStats,
    /// Non-fatal errors from walking and traversal.
    pub errors: Vec<ScanError>,
    /// Whether a scene tool was available.
    pub scene_tool: bool,
}

/// Runs the full scan pipeline for one project folder.
///
/// validate root → walk → seed store and worklist → locate scene tool →
/// process → [`ScanResult`].
#[derive(Debug, Clone)]
pub struct ProjectScanner {
    config: Config,
    root: Utf8PathBuf,
}

impl ProjectScanner {
    /// Creates a scanner after validating `config`.
    ///
    /// The root folder is canonicalised, so every stored path is absolute
    /// and comparable with the resolved paths reported by the scene tool.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root is not an existing
    /// directory or an option is out of range.
    pub fn new(config: Config) -> Result<Self, ScanError> {
        config.validate()?;
        config.validate_root()?;

        let requested = &config.scan.root_path;
        let root = requested
            .canonicalize_utf8()
            .map_err(|e| ConfigError::InvalidPath {
                path: requested.clone(),
                reason: e.to_string(),
            })?;

        info!(
            root = %root,
            recursive = config.scan.recursive,
            follow_external = config.scan.follow_external,
            "Creating project scanner"
        );
        Ok(Self { config, root })
    }

    /// Returns the canonical project root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the configuration in use.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Scans the project, locating the scene tool from configuration.
    ///
    /// A missing scene tool is logged and the scan runs in degraded mode.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root vanished since creation.
    pub fn scan(&self) -> Result<ScanResult, ScanError> {
        let scene = self.config.scene.blender_path.as_deref();
        let tool = match BlenderTool::locate(scene, self.config.scene.timeout()) {
            Ok(tool) => Some(tool),
            Err(err) => {
                warn!(error = %err, "Scene tool unavailable, scene files will not be expanded");
                None
            }
        };
        self.scan_with(tool.as_ref().map(|t| t as &dyn SceneExtractor))
    }

    /// Scans the project with an explicit scene extractor.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root vanished since creation.
    pub fn scan_with(&self, scene: Option<&dyn SceneExtractor>) -> Result<ScanResult, ScanError> {
        info!(root = %self.root, "Starting scan");

        let walked = FileWalker::new(&self.root)?
            .with_skip_names(&self.config.scan.skip_names)
            .with_recursive(self.config.scan.recursive)
            .collect_paths();
        info!(count = walked.paths.len(), "Collected project files");

        let mut store = MetadataStore::with_root(&self.root);
        let mut work = Worklist::new();
        let mut errors = walked.errors;

        for path in &walked.paths {
            match entry_for_path(path) {
                Ok(entry) => work.push(store.add_entry(entry)),
                Err(err) => {
                    warn!(path = %path, error = %err, "Could not access file");
                    errors.push(err);
                }
            }
        }
        debug!(seeded = work.len(), "Seeded worklist");

        let mut links = LinkRegistry::new();
        let mut processor = FileProcessor::new(scene, self.config.scan.follow_external);
        processor.process_worklist(&mut store, &mut links, &mut work);
        let processed = processor.finish();
        errors.extend(processed.errors);

        Ok(ScanResult {
            store,
            links,
            processed: processed.processed,
            stats: processed.stats,
            errors,
            scene_tool: scene.is_some(),
        })
    }
}
