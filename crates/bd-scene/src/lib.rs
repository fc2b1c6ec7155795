//! Scene-container inspection for blendoc.
//!
//! Scene files (`.blend`) are opaque without Blender itself, so their
//! statistics and references are read by running Blender headless with a
//! small helper script. [`SceneExtractor`] is the seam the file processor
//! depends on; [`BlenderTool`] is the production implementation.
//!
//! # Example
//!
//! ```no_run
//! use bd_scene::{BlenderTool, SceneExtractor};
//! use camino::Utf8Path;
//! use std::time::Duration;
//!
//! let tool = BlenderTool::locate(None, Duration::from_secs(120))?;
//! let scene = Utf8Path::new("/project/sets/street.blend");
//!
//! let meta = tool.extract_metadata(scene);
//! println!("{} objects", meta.object_count);
//! for dep in tool.extract_dependencies(scene) {
//!     println!("-> {dep}");
//! }
//! # Ok::<(), bd_scene::SceneError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod script;
pub mod tool;

use bd_core::SceneMetadata;
use camino::{Utf8Path, Utf8PathBuf};

pub use error::SceneError;
pub use tool::{BlenderTool, DEFAULT_TIMEOUT};

/// Reads statistics and outgoing references from a scene-container file.
///
/// Implementations never fail: any problem is logged and the call returns
/// [`SceneMetadata::default`] or an empty list.
pub trait SceneExtractor {
    /// Returns scene statistics for `path`.
    fn extract_metadata(&self, path: &Utf8Path) -> SceneMetadata;

    /// Returns the absolute paths of files referenced by `path`.
    fn extract_dependencies(&self, path: &Utf8Path) -> Vec<Utf8PathBuf>;
}
