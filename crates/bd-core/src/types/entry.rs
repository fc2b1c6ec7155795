//! File records tracked during a project scan.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::kind::FileKind;
use super::metadata::FileMetadata;

/// Stable index of a [`FileEntry`] inside a [`MetadataStore`](crate::MetadataStore).
///
/// Entries are never removed from the store, and replacing an entry with the
/// same path reuses its slot, so an id stays valid for the whole run.
///
/// # Examples
///
/// ```
/// use bd_core::EntryId;
///
/// let id = EntryId::new(3);
/// assert_eq!(id.index(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub usize);

impl EntryId {
    /// Creates an id from a raw arena index.
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for EntryId {
    #[inline]
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// A single file of the project with its extracted metadata and dependencies.
///
/// The `path` is derived from `folder` and `name` when the entry is created
/// and cannot change afterwards; it is the key used by the
/// [`MetadataStore`](crate::MetadataStore).
///
/// # Examples
///
/// ```
/// use bd_core::{EntryId, FileEntry, FileKind};
///
/// let mut entry = FileEntry::new("scene.blend", "/project/sets", 4096, "blend");
/// assert_eq!(entry.path().as_str(), "/project/sets/scene.blend");
/// assert_eq!(entry.kind(), FileKind::Container);
///
/// assert!(entry.add_link(EntryId::new(7)));
/// assert!(!entry.add_link(EntryId::new(7)));
/// assert_eq!(entry.links(), &[EntryId::new(7)]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    name: String,
    folder: Utf8PathBuf,
    path: Utf8PathBuf,

    /// File size in bytes.
    pub size: u64,

    /// Lower-cased extension, sniffed mimetype suffix, or `"unknown"`.
    pub file_type: String,

    /// Extraction result, `None` until the processor has visited the entry
    /// or when nothing could be extracted for this type.
    pub metadata: Option<FileMetadata>,

    links: SmallVec<[EntryId; 4]>,

    /// Whether the traversal has fully handled this entry.
    pub processed: bool,
}

impl FileEntry {
    /// Creates an unprocessed entry with no metadata and no links.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        folder: impl Into<Utf8PathBuf>,
        size: u64,
        file_type: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let folder = folder.into();
        let path = folder.join(&name);
        Self {
            name,
            folder,
            path,
            size,
            file_type: file_type.into(),
            metadata: None,
            links: SmallVec::new(),
            processed: false,
        }
    }

    /// Returns the file name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the containing folder.
    #[inline]
    #[must_use]
    pub fn folder(&self) -> &Utf8Path {
        &self.folder
    }

    /// Returns the full path (`folder/name`).
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Classifies the entry by its file type.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FileKind {
        FileKind::of(&self.file_type)
    }

    /// Returns the entries this file depends on, in the order they were linked.
    #[inline]
    #[must_use]
    pub fn links(&self) -> &[EntryId] {
        &self.links
    }

    /// Records a dependency on `target`.
    ///
    /// Returns `false` if the target was already linked.
    pub fn add_link(&mut self, target: EntryId) -> bool {
        if self.links.contains(&target) {
            return false;
        }
        self.links.push(target);
        true
    }
}
