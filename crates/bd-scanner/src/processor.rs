//! Worklist-driven dependency traversal.
//!
//! [`FileProcessor`] drains a [`Worklist`] front to back. Leaf and unknown
//! files get their metadata extracted. Scene containers are handed to a
//! [`SceneExtractor`]; every file they reference is added to the store (if
//! new), queued at the back, and linked in the [`LinkRegistry`]. The result
//! is a breadth-first expansion by discovery depth in which every path is
//! processed at most once.
//!
//! # Example
//!
//! ```
//! use bd_core::{FileEntry, LinkRegistry, MetadataStore, Worklist};
//! use bd_scanner::FileProcessor;
//!
//! let mut store = MetadataStore::with_root("/project");
//! let id = store.add_entry(FileEntry::new("scene.blend", "/project", 10, "blend"));
//! let mut links = LinkRegistry::new();
//! let mut work: Worklist = [id].into_iter().collect();
//!
//! // Without a scene tool, containers are visited but not expanded.
//! let mut processor = FileProcessor::new(None, false);
//! processor.process_worklist(&mut store, &mut links, &mut work);
//!
//! let result = processor.finish();
//! assert_eq!(result.processed, vec![id]);
//! assert_eq!(result.stats.degraded, 1);
//! assert!(store.entry(id).is_some_and(|e| e.processed));
//! ```

use bd_core::{
    ContainerMetadata, EntryId, FileKind, FileMetadata, FxHashSet, LinkRegistry, MetadataStore,
    Worklist, normalize_path,
};
use bd_scene::SceneExtractor;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::classify::entry_for_path;
use crate::error::ScanError;
use crate::extractor::MetadataExtractor;
use crate::stats::ProcessStats;

/// Everything a traversal produced besides the store and registry contents.
#[derive(Debug, Default)]
pub struct ProcessResult {
    /// Processed entries in completion order.
    pub processed: Vec<EntryId>,
    /// Traversal counters.
    pub stats: ProcessStats,
    /// Non-fatal problems, in the order they occurred.
    pub errors: Vec<ScanError>,
}

/// Drains a worklist, extracting metadata and expanding container dependencies.
pub struct FileProcessor<'a> {
    scene: Option<&'a dyn SceneExtractor>,
    extractor: MetadataExtractor,
    follow_external: bool,
    processed: FxHashSet<Utf8PathBuf>,
    output: Vec<EntryId>,
    stats: ProcessStats,
    errors: Vec<ScanError>,
}

impl std::fmt::Debug for FileProcessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProcessor")
            .field("scene", &self.scene.is_some())
            .field("follow_external", &self.follow_external)
            .field("processed", &self.processed.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<'a> FileProcessor<'a> {
    /// Creates a processor.
    ///
    /// With `scene` set to `None` the processor runs in degraded mode:
    /// containers receive default scene metadata and nothing is expanded.
    /// With `follow_external` unset, references outside the store's root are
    /// only recorded on the referencing container.
    #[must_use]
    pub fn new(scene: Option<&'a dyn SceneExtractor>, follow_external: bool) -> Self {
        Self {
            scene,
            extractor: MetadataExtractor::new(),
            follow_external,
            processed: FxHashSet::default(),
            output: Vec::new(),
            stats: ProcessStats::default(),
            errors: Vec::new(),
        }
    }

    /// Processes entries until `work` is empty.
    ///
    /// Entries whose path was already processed, by this call or an earlier
    /// one on the same processor, are discarded.
    pub fn process_worklist(
        &mut self,
        store: &mut MetadataStore,
        links: &mut LinkRegistry,
        work: &mut Worklist,
    ) {
        while let Some(id) = work.pop() {
            let Some(entry) = store.entry(id) else {
                debug!(id = id.index(), "Dropping unknown entry id");
                continue;
            };
            let path = entry.path().to_owned();
            if !self.processed.insert(path.clone()) {
                self.stats.duplicates += 1;
                continue;
            }

            match entry.kind() {
                FileKind::Container => self.process_container(id, &path, store, links, work),
                kind => self.process_file(id, &path, kind, store),
            }

            if let Some(entry) = store.entry_mut(id) {
                entry.processed = true;
            }
            self.output.push(id);
        }
    }

    /// Processed entries so far, in completion order.
    #[inline]
    #[must_use]
    pub fn output(&self) -> &[EntryId] {
        &self.output
    }

    /// Counters so far.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &ProcessStats {
        &self.stats
    }

    /// Consumes the processor and returns what it produced.
    #[must_use]
    pub fn finish(self) -> ProcessResult {
        info!(
            processed = self.output.len(),
            containers = self.stats.containers,
            discovered = self.stats.discovered,
            errors = self.errors.len(),
            "Traversal complete"
        );
        ProcessResult {
            processed: self.output,
            stats: self.stats,
            errors: self.errors,
        }
    }

    fn process_file(&mut self, id: EntryId, path: &Utf8Path, kind: FileKind, store: &mut MetadataStore) {
        let Some(entry) = store.entry_mut(id) else {
            return;
        };
        let metadata = self.extractor.extract(path, &entry.file_type);

        if metadata.as_ref().is_some_and(|m| m.error().is_some()) {
            self.stats.failed += 1;
        }
        if kind == FileKind::Leaf {
            self.stats.leaves += 1;
        } else {
            self.stats.unknown += 1;
        }
        debug!(%path, kind = kind.label(), "Processed file");
        entry.metadata = metadata;
    }

    fn process_container(
        &mut self,
        id: EntryId,
        path: &Utf8Path,
        store: &mut MetadataStore,
        links: &mut LinkRegistry,
        work: &mut Worklist,
    ) {
        self.stats.containers += 1;

        let Some(scene) = self.scene else {
            self.stats.degraded += 1;
            debug!(%path, "No scene tool, container not expanded");
            if let Some(entry) = store.entry_mut(id) {
                entry.metadata = Some(FileMetadata::Container(ContainerMetadata::default()));
            }
            return;
        };

        info!(%path, "Processing scene file");
        let mut container = ContainerMetadata::new(scene.extract_metadata(path));
        let mut targets = Vec::new();

        for reference in scene.extract_dependencies(path) {
            let dependency = normalize_path(&reference);
            if !self.follow_external && !store.is_within_root(&dependency) {
                debug!(%path, %dependency, "Recording external reference");
                self.stats.external_skipped += 1;
                container.external_links.push(dependency.into_string());
                continue;
            }

            if !dependency.exists() {
                warn!(%path, %dependency, "Referenced file not found");
                self.stats.missing += 1;
                continue;
            }

            let Some(target) = self.resolve_target(&dependency, store, work) else {
                continue;
            };

            if links.add_link(path, &dependency) {
                self.stats.links += 1;
                targets.push(target);
            } else {
                warn!(%path, %dependency, "Link would create a cycle");
                self.stats.cycles_rejected += 1;
                container.rejected_links.push(dependency.to_string());
                self.errors.push(ScanError::CycleRejected {
                    from: path.to_owned(),
                    to: dependency,
                });
            }
        }

        if let Some(entry) = store.entry_mut(id) {
            for target in targets {
                entry.add_link(target);
            }
            info!(%path, dependencies = entry.links().len(), "Processed scene file");
            entry.metadata = Some(FileMetadata::Container(container));
        }
    }

    /// Returns the store id for `dependency`, adding and queueing it if new.
    fn resolve_target(
        &mut self,
        dependency: &Utf8Path,
        store: &mut MetadataStore,
        work: &mut Worklist,
    ) -> Option<EntryId> {
        if let Some(existing) = store.id_of(dependency) {
            return Some(existing);
        }

        match entry_for_path(dependency) {
            Ok(entry) => {
                let id = store.add_entry(entry);
                work.push(id);
                self.stats.discovered += 1;
                debug!(%dependency, "Discovered dependency");
                Some(id)
            }
            Err(err) => {
                warn!(%dependency, error = %err, "Could not add dependency");
                self.errors.push(err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bd_core::{FxHashMap, SceneMetadata};

    use super::*;

    /// Scene extractor answering from a fixed dependency table.
    #[derive(Default)]
    struct FakeScene {
        deps: FxHashMap<Utf8PathBuf, Vec<Utf8PathBuf>>,
        calls: RefCell<Vec<Utf8PathBuf>>,
    }

    impl FakeScene {
        fn with(mut self, from: &Utf8Path, to: &[&Utf8Path]) -> Self {
            self.deps
                .insert(from.to_owned(), to.iter().map(|p| (*p).to_owned()).collect());
            self
        }
    }

    impl SceneExtractor for FakeScene {
        fn extract_metadata(&self, path: &Utf8Path) -> SceneMetadata {
            self.calls.borrow_mut().push(path.to_owned());
            SceneMetadata {
                object_count: 1,
                ..SceneMetadata::default()
            }
        }

        fn extract_dependencies(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
            self.deps.get(path).cloned().unwrap_or_default()
        }
    }

    /// Scene extractor that behaves like a tool that always times out.
    struct TimedOutScene;

    impl SceneExtractor for TimedOutScene {
        fn extract_metadata(&self, _: &Utf8Path) -> SceneMetadata {
            SceneMetadata::default()
        }

        fn extract_dependencies(&self, _: &Utf8Path) -> Vec<Utf8PathBuf> {
            Vec::new()
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        root: Utf8PathBuf,
        outside: Utf8PathBuf,
        store: MetadataStore,
        links: LinkRegistry,
        work: Worklist,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let base = Utf8Path::from_path(dir.path()).unwrap().to_owned();
            let root = base.join("project");
            let outside = base.join("library");
            std::fs::create_dir_all(&root).unwrap();
            std::fs::create_dir_all(&outside).unwrap();
            Self {
                _dir: dir,
                store: MetadataStore::with_root(&root),
                root,
                outside,
                links: LinkRegistry::new(),
                work: Worklist::new(),
            }
        }

        /// Writes a file and seeds it into the store and worklist.
        fn seed(&mut self, relative: &str, bytes: &[u8]) -> Utf8PathBuf {
            let path = self.write(&self.root.join(relative), bytes);
            let id = self.store.add_entry(entry_for_path(&path).unwrap());
            self.work.push(id);
            path
        }

        fn write(&self, path: &Utf8Path, bytes: &[u8]) -> Utf8PathBuf {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, bytes).unwrap();
            path.to_owned()
        }

        fn run(&mut self, scene: Option<&dyn SceneExtractor>, follow_external: bool) -> ProcessResult {
            let mut processor = FileProcessor::new(scene, follow_external);
            processor.process_worklist(&mut self.store, &mut self.links, &mut self.work);
            processor.finish()
        }

        fn container(&self, path: &Utf8Path) -> ContainerMetadata {
            self.store
                .get_entry(path)
                .and_then(|e| e.metadata.as_ref())
                .and_then(FileMetadata::as_container)
                .cloned()
                .unwrap()
        }

        fn output_paths(&self, result: &ProcessResult) -> Vec<Utf8PathBuf> {
            result
                .processed
                .iter()
                .map(|&id| self.store.entry(id).unwrap().path().to_owned())
                .collect()
        }
    }

    #[test]
    fn test_leaf_and_unknown_files() {
        let mut fx = Fixture::new();
        let notes = fx.seed("notes.txt", b"a b\nc\n");
        let blob = fx.seed("data.bin", b"\0\0");

        let result = fx.run(None, false);

        assert_eq!(result.processed.len(), 2);
        assert_eq!(result.stats.leaves, 1);
        assert_eq!(result.stats.unknown, 1);
        assert!(matches!(
            fx.store.get_entry(&notes).unwrap().metadata,
            Some(FileMetadata::Text(_))
        ));
        assert!(fx.store.get_entry(&blob).unwrap().metadata.is_none());
        assert!(fx.store.entries().all(|e| e.processed));
    }

    #[test]
    fn test_shared_dependency_processed_once() {
        let mut fx = Fixture::new();
        let a = fx.seed("a.blend", b"BLENDER");
        let b = fx.seed("b.blend", b"BLENDER");
        let tex = fx.write(&fx.root.join("tex/wood.png"), b"png");
        let scene = FakeScene::default().with(&a, &[&tex]).with(&b, &[&tex]);

        let result = fx.run(Some(&scene), false);

        let paths = fx.output_paths(&result);
        assert_eq!(paths, vec![a.clone(), b.clone(), tex.clone()]);
        assert_eq!(result.stats.discovered, 1);
        assert_eq!(fx.store.len(), 3);
        assert_eq!(fx.links.get_reverse_links(&tex).len(), 2);

        let tex_id = fx.store.id_of(&tex).unwrap();
        assert_eq!(fx.store.get_entry(&a).unwrap().links(), &[tex_id]);
        assert_eq!(fx.store.get_entry(&b).unwrap().links(), &[tex_id]);
    }

    #[test]
    fn test_already_queued_entry_is_not_duplicated() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        let tex = fx.seed("wood.png", b"png");
        let scene = FakeScene::default().with(&scene_path, &[&tex]);

        let result = fx.run(Some(&scene), false);

        assert_eq!(fx.output_paths(&result), vec![scene_path.clone(), tex.clone()]);
        assert_eq!(result.stats.discovered, 0);
        assert!(fx.links.contains(&scene_path, &tex));
    }

    #[test]
    fn test_duplicate_queue_entries_discarded() {
        let mut fx = Fixture::new();
        let notes = fx.seed("notes.txt", b"x");
        let id = fx.store.id_of(&notes).unwrap();
        fx.work.push(id);

        let result = fx.run(None, false);
        assert_eq!(result.processed, vec![id]);
        assert_eq!(result.stats.duplicates, 1);
    }

    #[test]
    fn test_external_reference_not_followed() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        let tex = fx.write(&fx.root.join("tex.png"), b"png");
        let shared = fx.write(&fx.outside.join("shared.blend"), b"BLENDER");
        let scene = FakeScene::default().with(&scene_path, &[&tex, &shared]);

        let result = fx.run(Some(&scene), false);

        assert_eq!(fx.output_paths(&result), vec![scene_path.clone(), tex.clone()]);
        assert!(fx.store.get_entry(&shared).is_none());
        assert_eq!(fx.links.all_links(), vec![(scene_path.as_path(), tex.as_path())]);
        assert_eq!(fx.container(&scene_path).external_links, vec![shared.to_string()]);
        assert_eq!(result.stats.external_skipped, 1);
    }

    #[test]
    fn test_external_reference_followed() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        let tex = fx.write(&fx.root.join("tex.png"), b"png");
        let shared = fx.write(&fx.outside.join("shared.blend"), b"BLENDER");
        let scene = FakeScene::default().with(&scene_path, &[&tex, &shared]);

        let result = fx.run(Some(&scene), true);

        assert_eq!(
            fx.output_paths(&result),
            vec![scene_path.clone(), tex.clone(), shared.clone()]
        );
        assert!(fx.links.contains(&scene_path, &shared));
        assert!(fx.container(&scene_path).external_links.is_empty());
        // The followed file is itself treated as a container.
        assert_eq!(result.stats.containers, 2);
        assert!(scene.calls.borrow().contains(&shared));
        assert!(fx.container(&shared).rejected_links.is_empty());
    }

    #[test]
    fn test_parent_relative_reference_is_external() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        let shared = fx.write(&fx.outside.join("shared.blend"), b"BLENDER");
        let escaping = fx.root.join("../library/shared.blend");
        let missing = fx.root.join("sets/../../library/gone.png");
        let scene = FakeScene::default().with(&scene_path, &[&escaping, &missing]);

        let result = fx.run(Some(&scene), false);

        assert_eq!(fx.store.len(), 1);
        assert!(fx.store.get_entry(&escaping).is_none());
        assert!(fx.store.get_entry(&shared).is_none());
        assert_eq!(result.stats.containers, 1);
        assert_eq!(result.stats.external_skipped, 2);
        assert_eq!(result.stats.missing, 0);
        assert_eq!(
            fx.container(&scene_path).external_links,
            vec![shared.to_string(), fx.outside.join("gone.png").to_string()]
        );
    }

    #[test]
    fn test_parent_relative_reference_followed_under_normal_key() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        let shared = fx.write(&fx.outside.join("shared.blend"), b"BLENDER");
        let escaping = fx.root.join("../library/shared.blend");
        let scene = FakeScene::default().with(&scene_path, &[&escaping]);

        fx.run(Some(&scene), true);

        assert!(fx.store.get_entry(&shared).is_some());
        assert!(fx.store.get_entry(&escaping).is_none());
        assert!(fx.links.contains(&scene_path, &shared));
    }

    #[test]
    fn test_missing_dependency_skipped() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        let gone = fx.root.join("gone.png");
        let scene = FakeScene::default().with(&scene_path, &[&gone]);

        let result = fx.run(Some(&scene), false);

        assert_eq!(result.processed.len(), 1);
        assert_eq!(result.stats.missing, 1);
        assert!(fx.links.is_empty());
        assert!(fx.store.get_entry(&gone).is_none());
    }

    #[test]
    fn test_cycle_rejected_and_recorded() {
        let mut fx = Fixture::new();
        let a = fx.seed("a.blend", b"BLENDER");
        let b = fx.seed("b.blend", b"BLENDER");
        let scene = FakeScene::default().with(&a, &[&b]).with(&b, &[&a]);

        let result = fx.run(Some(&scene), false);

        assert!(fx.links.contains(&a, &b));
        assert!(!fx.links.contains(&b, &a));
        assert!(fx.store.get_entry(&b).unwrap().links().is_empty());
        assert_eq!(fx.container(&b).rejected_links, vec![a.to_string()]);
        assert_eq!(result.stats.cycles_rejected, 1);
        assert!(matches!(
            result.errors.as_slice(),
            [ScanError::CycleRejected { from, to }] if *from == b && *to == a
        ));
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut fx = Fixture::new();
        let a = fx.seed("a.blend", b"BLENDER");
        let scene = FakeScene::default().with(&a, &[&a]);

        let result = fx.run(Some(&scene), false);

        assert!(fx.links.is_empty());
        assert_eq!(result.stats.cycles_rejected, 1);
        assert_eq!(result.processed.len(), 1);
    }

    #[test]
    fn test_timed_out_tool_yields_defaults() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        fx.seed("tex.png", b"png");

        let result = fx.run(Some(&TimedOutScene), false);

        assert_eq!(result.processed.len(), 2);
        let container = fx.container(&scene_path);
        assert_eq!(container.scene, SceneMetadata::default());
        assert!(fx.links.is_empty());
        assert!(fx.store.entries().all(|e| e.processed));
    }

    #[test]
    fn test_degraded_mode() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");

        let result = fx.run(None, false);

        assert_eq!(result.stats.degraded, 1);
        assert_eq!(fx.container(&scene_path), ContainerMetadata::default());
    }

    #[test]
    fn test_breadth_first_order() {
        let mut fx = Fixture::new();
        let top = fx.seed("top.blend", b"BLENDER");
        let other = fx.seed("other.txt", b"x");
        let mid = fx.write(&fx.root.join("mid.blend"), b"BLENDER");
        let deep = fx.write(&fx.root.join("deep.png"), b"png");
        let scene = FakeScene::default().with(&top, &[&mid]).with(&mid, &[&deep]);

        let result = fx.run(Some(&scene), false);

        assert_eq!(fx.output_paths(&result), vec![top, other, mid, deep]);
    }

    #[test]
    fn test_discovered_entry_built_from_disk() {
        let mut fx = Fixture::new();
        let scene_path = fx.seed("scene.blend", b"BLENDER");
        let notes = fx.write(&fx.root.join("docs/readme.md"), b"# hi\n");
        let scene = FakeScene::default().with(&scene_path, &[&notes]);

        fx.run(Some(&scene), false);

        let entry = fx.store.get_entry(&notes).unwrap();
        assert_eq!(entry.file_type, "md");
        assert_eq!(entry.size, 5);
        assert!(entry.processed);
        assert_eq!(fx.store.get_by_folder(&fx.root.join("docs")).len(), 1);
        assert_eq!(fx.store.get_entry(&scene_path).unwrap().links().len(), 1);
    }
}
