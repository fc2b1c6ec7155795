//! Builds folder-level and file-level graphs from a finished scan.

use bd_core::{FileEntry, GraphMode, LinkRegistry, MetadataStore};
use camino::Utf8Path;
use tracing::{debug, info};

use crate::graph::{DependencyGraph, FileNode, FolderNode, GraphNode, NodeAttrs, ROOT_NODE};

/// Reads a store and its link registry and produces a [`DependencyGraph`].
///
/// Every link event in the registry contributes to an edge weight, so a
/// link recorded twice yields weight 2.
#[derive(Debug, Clone, Copy)]
pub struct DigraphBuilder<'a> {
    store: &'a MetadataStore,
    links: &'a LinkRegistry,
}

impl<'a> DigraphBuilder<'a> {
    /// Creates a builder over a populated store and registry.
    #[must_use]
    pub const fn new(store: &'a MetadataStore, links: &'a LinkRegistry) -> Self {
        Self { store, links }
    }

    /// Builds the graph for `mode`.
    #[must_use]
    pub fn build(&self, mode: GraphMode) -> DependencyGraph {
        match mode {
            GraphMode::Folder => self.build_by_folder_hierarchy(),
            GraphMode::File => self.build_file_level(),
        }
    }

    /// One node per folder, edges aggregated from cross-folder file links.
    #[must_use]
    pub fn build_by_folder_hierarchy(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new(GraphMode::Folder);

        for folder in self.store.folders() {
            let members = self.store.get_by_folder(folder);
            graph.add_node(GraphNode {
                id: self.folder_id(folder),
                attrs: NodeAttrs::Folder(FolderNode {
                    folder_path: folder.to_string(),
                    file_count: members.len(),
                    total_size: members.iter().map(|e| e.size).sum(),
                    files: members.iter().map(|e| e.name().to_owned()).collect(),
                }),
            });
        }

        for (source, target) in self.endpoints() {
            let (Some(from), Some(to)) = (
                graph.index_of(&self.folder_id(source.folder())),
                graph.index_of(&self.folder_id(target.folder())),
            ) else {
                continue;
            };
            if from == to {
                continue;
            }
            graph.bump_edge(
                from,
                to,
                Some((source.name().to_owned(), target.name().to_owned())),
            );
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built folder graph"
        );
        graph
    }

    /// One node per file, one edge per distinct link.
    #[must_use]
    pub fn build_file_level(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new(GraphMode::File);

        for entry in self.store.entries() {
            graph.add_node(self.file_node(entry));
        }

        for (source, target) in self.endpoints() {
            let (Some(from), Some(to)) = (
                graph.index_of(&self.store.get_relative_path(source)),
                graph.index_of(&self.store.get_relative_path(target)),
            ) else {
                continue;
            };
            graph.bump_edge(from, to, None);
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built file graph"
        );
        graph
    }

    /// Resolves every link event to its store entries, skipping unknown paths.
    fn endpoints(&self) -> impl Iterator<Item = (&'a FileEntry, &'a FileEntry)> + 'a {
        let store = self.store;
        self.links.link_events().filter_map(move |(source, target)| {
            match (store.get_entry(source), store.get_entry(target)) {
                (Some(s), Some(t)) => Some((s, t)),
                _ => {
                    debug!(source = %source, target = %target, "Skipping link with unknown endpoint");
                    None
                }
            }
        })
    }

    fn folder_id(&self, folder: &Utf8Path) -> String {
        match self.store.relative_to_root(folder) {
            Some(relative) if relative.is_empty() => ROOT_NODE.to_owned(),
            Some(relative) => relative,
            None => folder.to_string(),
        }
    }

    fn file_node(&self, entry: &FileEntry) -> GraphNode {
        GraphNode {
            id: self.store.get_relative_path(entry),
            attrs: NodeAttrs::File(FileNode {
                folder_group: self.folder_id(entry.folder()),
                size: entry.size,
                file_type: entry.file_type.clone(),
                label: entry.name().to_owned(),
            }),
        }
    }
}
