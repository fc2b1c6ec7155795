//! File type derivation and traversal classification.

use serde::{Deserialize, Serialize};

/// File type of the scene-container format whose dependencies are expanded.
pub const CONTAINER_TYPE: &str = "blend";

/// File type recorded when neither an extension nor content sniffing helps.
pub const UNKNOWN_TYPE: &str = "unknown";

/// File types that never reference further project files.
pub const LEAF_TYPES: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "tiff", "tif", "exr", "hdr", "bmp", "gif", "webp",
    // Audio
    "mp3", "wav", "flac", "aac", "ogg", "aiff",
    // Text
    "txt", "md", "rst", "csv", "json", "xml", "yaml", "yml",
    // Fonts
    "ttf", "otf", "woff", "woff2",
    // Documents and interchange models
    "pdf", "obj", "fbx", "usd", "usda", "glb", "gltf",
];

/// How the traversal treats a file.
///
/// # Examples
///
/// ```
/// use bd_core::FileKind;
///
/// assert_eq!(FileKind::of("blend"), FileKind::Container);
/// assert_eq!(FileKind::of("png"), FileKind::Leaf);
/// assert_eq!(FileKind::of("psd"), FileKind::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Known not to carry further file dependencies.
    Leaf,
    /// A scene container whose linked files are expanded.
    Container,
    /// Anything else; metadata is extracted best-effort, nothing is expanded.
    Unknown,
}

impl FileKind {
    /// Classifies a lower-cased file type.
    #[must_use]
    pub fn of(file_type: &str) -> Self {
        if file_type == CONTAINER_TYPE {
            Self::Container
        } else if LEAF_TYPES.contains(&file_type) {
            Self::Leaf
        } else {
            Self::Unknown
        }
    }

    /// Returns a short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Container => "container",
            Self::Unknown => "unknown",
        }
    }
}

/// Derives a file type from the extension of `name`, lower-cased.
///
/// Returns `None` for names without an extension (including dotfiles such
/// as `.gitignore`), so callers can fall back to content sniffing.
///
/// # Examples
///
/// ```
/// use bd_core::file_type_from_name;
///
/// assert_eq!(file_type_from_name("Hero.BLEND").as_deref(), Some("blend"));
/// assert_eq!(file_type_from_name("archive.tar.gz").as_deref(), Some("gz"));
/// assert_eq!(file_type_from_name("README"), None);
/// ```
#[must_use]
pub fn file_type_from_name(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
