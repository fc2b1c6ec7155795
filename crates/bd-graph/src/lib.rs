//! Dependency graphs for blendoc.
//!
//! Turns a scanned [`MetadataStore`](bd_core::MetadataStore) and
//! [`LinkRegistry`](bd_core::LinkRegistry) into a directed graph, at folder
//! or file granularity.
//!
//! # Modes
//!
//! - **Folder**: one node per folder. The project root is the node `.`
//!   ([`ROOT_NODE`]), other folders use their path relative to the root, and
//!   folders outside the root keep their absolute path. Links between files
//!   in the same folder produce no edge.
//! - **File**: one node per file, keyed by relative path.
//!
//! In both modes an edge's weight is the number of link events behind it.
//!
//! # Example
//!
//! ```
//! use bd_core::{FileEntry, GraphMode, LinkRegistry, MetadataStore};
//! use bd_graph::{DigraphBuilder, ROOT_NODE};
//! use camino::Utf8Path;
//!
//! let mut store = MetadataStore::with_root("/film");
//! store.add_entry(FileEntry::new("shot.blend", "/film", 512, "blend"));
//! store.add_entry(FileEntry::new("sky.hdr", "/film/hdri", 4096, "hdr"));
//!
//! let mut links = LinkRegistry::new();
//! links.add_link(Utf8Path::new("/film/shot.blend"), Utf8Path::new("/film/hdri/sky.hdr"));
//!
//! let graph = DigraphBuilder::new(&store, &links).build(GraphMode::Folder);
//! assert_eq!(graph.edge(ROOT_NODE, "hdri").map(|e| e.weight), Some(1));
//! assert!(graph.stats().is_dag);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod builder;
mod export;
mod graph;

pub use builder::DigraphBuilder;
pub use export::{to_dot, to_json};
pub use graph::{
    DependencyGraph, FileNode, FolderInfo, FolderNode, GraphEdge, GraphNode, GraphStats,
    NodeAttrs, ROOT_NODE,
};
