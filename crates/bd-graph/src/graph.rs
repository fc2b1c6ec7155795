//! Immutable dependency graph produced by the builder.

use std::fmt;

use bd_core::{FxHashMap, GraphMode};
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Node id of the project root folder in folder graphs.
///
/// No relative folder path renders as `.`, so a subfolder named `root`
/// keeps its own node.
pub const ROOT_NODE: &str = ".";

/// Attributes of a folder node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Absolute folder path.
    pub folder_path: String,
    /// Number of files directly inside the folder.
    pub file_count: usize,
    /// Sum of their sizes in bytes.
    pub total_size: u64,
    /// Their file names, in store order.
    pub files: Vec<String>,
}

/// Attributes of a file node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Folder node id the file belongs to, for visual clustering.
    pub folder_group: String,
    /// File size in bytes.
    pub size: u64,
    /// File type.
    pub file_type: String,
    /// Display label (the file name).
    pub label: String,
}

/// Mode-specific node attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeAttrs {
    /// Folder graph node.
    Folder(FolderNode),
    /// File graph node.
    File(FileNode),
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node id: a relative folder path, [`ROOT_NODE`], or a relative file path.
    pub id: String,
    /// Attributes.
    #[serde(flatten)]
    pub attrs: NodeAttrs,
}

impl GraphNode {
    /// Returns the folder attributes of a folder node.
    #[must_use]
    pub const fn as_folder(&self) -> Option<&FolderNode> {
        match &self.attrs {
            NodeAttrs::Folder(folder) => Some(folder),
            NodeAttrs::File(_) => None,
        }
    }

    /// Returns the file attributes of a file node.
    #[must_use]
    pub const fn as_file(&self) -> Option<&FileNode> {
        match &self.attrs {
            NodeAttrs::File(file) => Some(file),
            NodeAttrs::Folder(_) => None,
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A collapsed edge between two nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Number of underlying file links.
    pub weight: u64,
    /// `(source file, target file)` names behind the edge (folder graphs only).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub file_links: Vec<(String, String)>,
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.weight)
    }
}

/// Summary figures for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Node granularity.
    pub mode: GraphMode,
    /// Number of nodes.
    pub node_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// `E / (N * (N - 1))`, zero for fewer than two nodes.
    pub density: f64,
    /// Whether the graph has no directed cycle.
    pub is_dag: bool,
    /// Number of weakly connected components.
    pub connected_components: usize,
}

/// Degree and membership details for one folder node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    /// Node id.
    pub node_id: String,
    /// Absolute folder path.
    pub folder_path: String,
    /// Number of files.
    pub file_count: usize,
    /// Sum of file sizes in bytes.
    pub total_size: u64,
    /// File names.
    pub files: Vec<String>,
    /// Number of folders depending on this one.
    pub in_degree: usize,
    /// Number of folders this one depends on.
    pub out_degree: usize,
}

/// Directed dependency graph over folders or files.
///
/// Built by [`DigraphBuilder`](crate::DigraphBuilder) and read-only after.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    mode: GraphMode,
    graph: DiGraph<GraphNode, GraphEdge>,
    index: FxHashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub(crate) fn new(mode: GraphMode) -> Self {
        Self {
            mode,
            graph: DiGraph::new(),
            index: FxHashMap::default(),
        }
    }

    /// Adds a node unless one with the same id exists.
    pub(crate) fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&ix) = self.index.get(&node.id) {
            return ix;
        }
        let id = node.id.clone();
        let ix = self.graph.add_node(node);
        self.index.insert(id, ix);
        ix
    }

    /// Adds one link to the edge `source -> target`, creating it at weight 1.
    pub(crate) fn bump_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        file_link: Option<(String, String)>,
    ) {
        let edge = match self.graph.find_edge(source, target) {
            Some(ix) => &mut self.graph[ix],
            None => {
                let ix = self.graph.add_edge(source, target, GraphEdge::default());
                &mut self.graph[ix]
            }
        };
        edge.weight += 1;
        edge.file_links.extend(file_link);
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub(crate) const fn inner(&self) -> &DiGraph<GraphNode, GraphEdge> {
        &self.graph
    }

    /// Node granularity.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> GraphMode {
        self.mode
    }

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|ix| &self.graph[ix])
    }

    /// Looks up the edge `source -> target` by node ids.
    #[must_use]
    pub fn edge(&self, source: &str, target: &str) -> Option<&GraphEdge> {
        let ix = self
            .graph
            .find_edge(self.index_of(source)?, self.index_of(target)?)?;
        Some(&self.graph[ix])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Edges as `(source id, target id, edge)`, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &GraphEdge)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].id.as_str(),
                self.graph[edge.target()].id.as_str(),
                edge.weight(),
            )
        })
    }

    /// Number of incoming edges of `id`, if it exists.
    #[must_use]
    pub fn in_degree(&self, id: &str) -> Option<usize> {
        self.degree(id, Direction::Incoming)
    }

    /// Number of outgoing edges of `id`, if it exists.
    #[must_use]
    pub fn out_degree(&self, id: &str) -> Option<usize> {
        self.degree(id, Direction::Outgoing)
    }

    /// `E / (N * (N - 1))`; zero for fewer than two nodes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (n as f64 * (n - 1) as f64)
    }

    /// Returns `true` if there is no directed cycle.
    #[must_use]
    pub fn is_dag(&self) -> bool {
        !algo::is_cyclic_directed(&self.graph)
    }

    /// Number of components when edge direction is ignored.
    #[must_use]
    pub fn weakly_connected_components(&self) -> usize {
        algo::connected_components(&self.graph)
    }

    /// Computes [`GraphStats`].
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            mode: self.mode,
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            density: self.density(),
            is_dag: self.is_dag(),
            connected_components: self.weakly_connected_components(),
        }
    }

    /// Folder nodes directly below the root, with [`ROOT_NODE`] first.
    ///
    /// Empty for file graphs. Folders outside the project root are not
    /// top-level.
    #[must_use]
    pub fn toplevel_folders(&self) -> Vec<&str> {
        if self.mode != GraphMode::Folder {
            return Vec::new();
        }

        let mut toplevel: Vec<&str> = self
            .nodes()
            .map(|node| node.id.as_str())
            .filter(|id| *id != ROOT_NODE && !id.contains('/'))
            .collect();
        toplevel.sort_unstable();
        if self.index.contains_key(ROOT_NODE) {
            toplevel.insert(0, ROOT_NODE);
        }
        toplevel
    }

    /// Returns details for a folder node.
    #[must_use]
    pub fn folder_info(&self, id: &str) -> Option<FolderInfo> {
        let folder = self.node(id)?.as_folder()?;
        Some(FolderInfo {
            node_id: id.to_owned(),
            folder_path: folder.folder_path.clone(),
            file_count: folder.file_count,
            total_size: folder.total_size,
            files: folder.files.clone(),
            in_degree: self.in_degree(id)?,
            out_degree: self.out_degree(id)?,
        })
    }

    fn degree(&self, id: &str, direction: Direction) -> Option<usize> {
        let ix = self.index_of(id)?;
        Some(self.graph.edges_directed(ix, direction).count())
    }
}
