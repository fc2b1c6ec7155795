//! Indexed storage for every file discovered during a run.
//!
//! [`MetadataStore`] owns all [`FileEntry`] records in a flat arena and
//! keeps three indices over them: by path (primary), by file type, and by
//! containing folder. Entries are addressed by [`EntryId`], so links between
//! files are plain indices rather than shared references.
//!
//! # Examples
//!
//! ```
//! use bd_core::{FileEntry, MetadataStore};
//! use camino::Utf8Path;
//!
//! let mut store = MetadataStore::new();
//! store.set_root_folder("/project");
//!
//! store.add_entry(FileEntry::new("hero.blend", "/project/chars", 1_000, "blend"));
//! store.add_entry(FileEntry::new("skin.png", "/project/chars", 200, "png"));
//!
//! assert_eq!(store.get_by_folder(Utf8Path::new("/project/chars")).len(), 2);
//! assert_eq!(store.get_by_type("png").len(), 1);
//!
//! let hero = store.get_entry(Utf8Path::new("/project/chars/hero.blend")).unwrap();
//! assert_eq!(store.get_relative_path(hero), "chars/hero.blend");
//! ```

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{EntryId, FileEntry};
use crate::{FxHashMap, FxHashSet};

/// Aggregate figures over the store contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of distinct paths stored.
    pub total_entries: usize,
    /// Number of distinct file types.
    pub unique_types: usize,
    /// Number of distinct containing folders.
    pub total_folders: usize,
    /// Sum of all entry sizes in bytes.
    pub total_size: u64,
    /// Number of entries marked as processed.
    pub processed_entries: usize,
}

/// Arena of [`FileEntry`] records with path, type, and folder indices.
///
/// # Replacement
///
/// Adding an entry whose path is already stored replaces the record in
/// place (last write wins). The replacement keeps the existing [`EntryId`],
/// so links held by other entries resolve to the new record. The type and
/// folder indices are updated to match the replacement.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entries: Vec<FileEntry>,
    by_path: FxHashMap<Utf8PathBuf, EntryId>,
    by_type: FxHashMap<String, Vec<EntryId>>,
    by_folder: FxHashMap<Utf8PathBuf, Vec<EntryId>>,
    root_folder: Option<Utf8PathBuf>,
}

impl MetadataStore {
    /// Creates an empty store with no root folder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store anchored at `root`.
    #[must_use]
    pub fn with_root(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root_folder: Some(root.into()),
            ..Self::default()
        }
    }

    /// Sets the folder used to compute relative paths.
    pub fn set_root_folder(&mut self, root: impl Into<Utf8PathBuf>) {
        self.root_folder = Some(root.into());
    }

    /// Returns the configured root folder.
    #[inline]
    #[must_use]
    pub fn root_folder(&self) -> Option<&Utf8Path> {
        self.root_folder.as_deref()
    }

    /// Inserts `entry`, replacing any record with the same path.
    ///
    /// Returns the id under which the entry is stored.
    pub fn add_entry(&mut self, entry: FileEntry) -> EntryId {
        if let Some(&id) = self.by_path.get(entry.path()) {
            debug!(path = %entry.path(), "Replacing stored entry");
            let previous = std::mem::replace(&mut self.entries[id.index()], entry);
            self.unindex(id, &previous);
            self.index(id);
            return id;
        }

        let id = EntryId::new(self.entries.len());
        self.by_path.insert(entry.path().to_owned(), id);
        self.entries.push(entry);
        self.index(id);
        id
    }

    /// Looks up an entry by exact path.
    #[must_use]
    pub fn get_entry(&self, path: &Utf8Path) -> Option<&FileEntry> {
        self.id_of(path).and_then(|id| self.entry(id))
    }

    /// Returns the id stored for `path`.
    #[inline]
    #[must_use]
    pub fn id_of(&self, path: &Utf8Path) -> Option<EntryId> {
        self.by_path.get(path).copied()
    }

    /// Returns the entry stored under `id`.
    #[inline]
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&FileEntry> {
        self.entries.get(id.index())
    }

    /// Returns the entry stored under `id` for modification.
    #[inline]
    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut FileEntry> {
        self.entries.get_mut(id.index())
    }

    /// Returns all entries of the given file type, in insertion order.
    #[must_use]
    pub fn get_by_type(&self, file_type: &str) -> Vec<&FileEntry> {
        self.resolve(self.by_type.get(file_type))
    }

    /// Returns all entries directly inside `folder`, in insertion order.
    #[must_use]
    pub fn get_by_folder(&self, folder: &Utf8Path) -> Vec<&FileEntry> {
        self.resolve(self.by_folder.get(folder))
    }

    /// Returns the path of `entry` relative to the root folder.
    ///
    /// Falls back to the absolute path when no root is configured or the
    /// entry lies outside of it. Separators are always `/`.
    #[must_use]
    pub fn get_relative_path(&self, entry: &FileEntry) -> String {
        self.relative_to_root(entry.path())
            .unwrap_or_else(|| entry.path().to_string())
    }

    /// Returns `path` relative to the root folder with `/` separators.
    ///
    /// Returns `Some("")` for the root itself and `None` when there is no
    /// root or `path` is outside of it.
    #[must_use]
    pub fn relative_to_root(&self, path: &Utf8Path) -> Option<String> {
        let root = self.root_folder.as_deref()?;
        let relative = path.strip_prefix(root).ok()?;
        Some(
            relative
                .components()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    /// Returns `true` if `path` lies under the root folder.
    ///
    /// `.` and `..` components are resolved first, so `<root>/../x` is
    /// outside. Always `false` when no root is configured.
    #[must_use]
    pub fn is_within_root(&self, path: &Utf8Path) -> bool {
        self.root_folder
            .as_deref()
            .is_some_and(|root| normalize_path(path).starts_with(root))
    }

    /// Iterates over all entries with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &FileEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (EntryId::new(index), entry))
    }

    /// Iterates over all entries, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter()
    }

    /// Returns the distinct folders holding at least one entry.
    #[must_use]
    pub fn folders(&self) -> Vec<&Utf8Path> {
        let mut seen = FxHashSet::default();
        self.entries
            .iter()
            .map(FileEntry::folder)
            .filter(|folder| seen.insert(*folder))
            .collect()
    }

    /// Returns the number of stored entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Computes aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_entries: self.entries.len(),
            unique_types: self.by_type.len(),
            total_folders: self.by_folder.len(),
            total_size: self.entries.iter().map(|e| e.size).sum(),
            processed_entries: self.entries.iter().filter(|e| e.processed).count(),
        }
    }

    fn index(&mut self, id: EntryId) {
        let entry = &self.entries[id.index()];
        self.by_type
            .entry(entry.file_type.clone())
            .or_default()
            .push(id);
        self.by_folder
            .entry(entry.folder().to_owned())
            .or_default()
            .push(id);
    }

    fn unindex(&mut self, id: EntryId, previous: &FileEntry) {
        remove_from_bucket(&mut self.by_type, previous.file_type.as_str(), id);
        remove_from_bucket(&mut self.by_folder, previous.folder(), id);
    }

    fn resolve(&self, ids: Option<&Vec<EntryId>>) -> Vec<&FileEntry> {
        ids.map(|ids| ids.iter().filter_map(|&id| self.entry(id)).collect())
            .unwrap_or_default()
    }
}

fn remove_from_bucket<K, Q>(index: &mut FxHashMap<K, Vec<EntryId>>, key: &Q, id: EntryId)
where
    K: std::borrow::Borrow<Q> + Eq + std::hash::Hash,
    Q: ?Sized + Eq + std::hash::Hash,
{
    if let Some(bucket) = index.get_mut(key) {
        bucket.retain(|&existing| existing != id);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// `..` at the filesystem root stays at the root. Symlinks are not followed.
///
/// ```
/// use bd_core::normalize_path;
/// use camino::Utf8Path;
///
/// let path = normalize_path(Utf8Path::new("/project/./sets/../../library/shared.blend"));
/// assert_eq!(path, Utf8Path::new("/library/shared.blend"));
/// ```
#[must_use]
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match normalized.components().next_back() {
                Some(Utf8Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                Some(Utf8Component::CurDir | Utf8Component::ParentDir) | None => {
                    normalized.push("..");
                }
            },
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_root() -> MetadataStore {
        MetadataStore::with_root("/project")
    }

    #[test]
    fn test_store_new_is_empty() {
        let store = MetadataStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats(), StoreStats::default());
        assert!(store.root_folder().is_none());
    }

    #[test]
    fn test_add_and_get_entry() {
        let mut store = store_with_root();
        let id = store.add_entry(FileEntry::new("a.png", "/project/tex", 10, "png"));

        let entry = store.get_entry(Utf8Path::new("/project/tex/a.png"));
        assert_eq!(entry.map(FileEntry::name), Some("a.png"));
        assert_eq!(store.id_of(Utf8Path::new("/project/tex/a.png")), Some(id));
        assert!(store.get_entry(Utf8Path::new("/project/tex/b.png")).is_none());
    }

    #[test]
    fn test_add_entry_same_path_replaces() {
        let mut store = store_with_root();
        let first = store.add_entry(FileEntry::new("a.dat", "/project", 10, "dat"));
        let second = store.add_entry(FileEntry::new("a.dat", "/project", 99, "bin"));

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_entry(Utf8Path::new("/project/a.dat")).map(|e| e.size), Some(99));

        // Indices follow the replacement.
        assert!(store.get_by_type("dat").is_empty());
        assert_eq!(store.get_by_type("bin").len(), 1);
        assert_eq!(store.get_by_folder(Utf8Path::new("/project")).len(), 1);
        assert_eq!(store.stats().unique_types, 1);
    }

    #[test]
    fn test_store_size_counts_distinct_paths() {
        let mut store = store_with_root();
        for (name, size) in [("a.png", 1), ("b.png", 2), ("a.png", 3), ("c.txt", 4), ("b.png", 5)] {
            store.add_entry(FileEntry::new(name, "/project", size, "png"));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_entry(Utf8Path::new("/project/a.png")).map(|e| e.size), Some(3));
        assert_eq!(store.get_entry(Utf8Path::new("/project/b.png")).map(|e| e.size), Some(5));
    }

    #[test]
    fn test_get_by_type_and_folder() {
        let mut store = store_with_root();
        store.add_entry(FileEntry::new("a.png", "/project/tex", 1, "png"));
        store.add_entry(FileEntry::new("b.png", "/project/tex", 1, "png"));
        store.add_entry(FileEntry::new("s.blend", "/project", 1, "blend"));

        let pngs: Vec<_> = store.get_by_type("png").iter().map(|e| e.name()).collect();
        assert_eq!(pngs, vec!["a.png", "b.png"]);
        assert_eq!(store.get_by_folder(Utf8Path::new("/project")).len(), 1);
        assert!(store.get_by_type("wav").is_empty());
        assert!(store.get_by_folder(Utf8Path::new("/elsewhere")).is_empty());
    }

    #[test]
    fn test_relative_path() {
        let store = store_with_root();
        let inside = FileEntry::new("a.png", "/project/tex/hi", 1, "png");
        let at_root = FileEntry::new("s.blend", "/project", 1, "blend");
        let outside = FileEntry::new("lib.blend", "/library", 1, "blend");

        assert_eq!(store.get_relative_path(&inside), "tex/hi/a.png");
        assert_eq!(store.get_relative_path(&at_root), "s.blend");
        assert_eq!(store.get_relative_path(&outside), "/library/lib.blend");
    }

    #[test]
    fn test_relative_path_without_root() {
        let store = MetadataStore::new();
        let entry = FileEntry::new("a.png", "/project", 1, "png");
        assert_eq!(store.get_relative_path(&entry), "/project/a.png");
        assert!(!store.is_within_root(entry.path()));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Utf8Path::new("/project/a/./b")), Utf8Path::new("/project/a/b"));
        assert_eq!(normalize_path(Utf8Path::new("/project/a/../b")), Utf8Path::new("/project/b"));
        assert_eq!(normalize_path(Utf8Path::new("/../x")), Utf8Path::new("/x"));
        assert_eq!(normalize_path(Utf8Path::new("a/../../b")), Utf8Path::new("../b"));
        assert_eq!(normalize_path(Utf8Path::new("../../b")), Utf8Path::new("../../b"));
    }

    #[test]
    fn test_parent_components_leave_root() {
        let store = store_with_root();
        assert!(!store.is_within_root(Utf8Path::new("/project/../library/shared.blend")));
        assert!(!store.is_within_root(Utf8Path::new("/project/sets/../../x.png")));
        assert!(store.is_within_root(Utf8Path::new("/project/sets/../tex/x.png")));
    }

    #[test]
    fn test_is_within_root() {
        let store = store_with_root();
        assert!(store.is_within_root(Utf8Path::new("/project/a/b.png")));
        assert!(!store.is_within_root(Utf8Path::new("/projects/b.png")));
        assert!(!store.is_within_root(Utf8Path::new("/library/b.png")));
    }

    #[test]
    fn test_stats() {
        let mut store = store_with_root();
        store.add_entry(FileEntry::new("a.png", "/project/tex", 100, "png"));
        store.add_entry(FileEntry::new("b.wav", "/project/sfx", 50, "wav"));
        let id = store.add_entry(FileEntry::new("c.png", "/project/tex", 25, "png"));
        if let Some(entry) = store.entry_mut(id) {
            entry.processed = true;
        }

        assert_eq!(
            store.stats(),
            StoreStats {
                total_entries: 3,
                unique_types: 2,
                total_folders: 2,
                total_size: 175,
                processed_entries: 1,
            }
        );
    }

    #[test]
    fn test_folders_and_iteration_order() {
        let mut store = store_with_root();
        store.add_entry(FileEntry::new("a", "/project/x", 0, "unknown"));
        store.add_entry(FileEntry::new("b", "/project/y", 0, "unknown"));
        store.add_entry(FileEntry::new("c", "/project/x", 0, "unknown"));

        assert_eq!(
            store.folders(),
            vec![Utf8Path::new("/project/x"), Utf8Path::new("/project/y")]
        );
        let ids: Vec<_> = store.iter().map(|(id, _)| id.index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
