//! DOT and JSON rendering of a [`DependencyGraph`].

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use serde::Serialize;

use crate::graph::{DependencyGraph, GraphEdge, GraphNode, GraphStats, NodeAttrs};

type Inner = DiGraph<GraphNode, GraphEdge>;

/// Renders the graph in Graphviz DOT syntax.
///
/// Nodes are labelled with their id. Folder nodes carry their file count and
/// size as a tooltip, file nodes their folder as `group`. Edges are labelled
/// with their weight, which also sets the pen width.
#[must_use]
pub fn to_dot(graph: &DependencyGraph) -> String {
    let edge_attrs = |_: &Inner, edge: EdgeReference<'_, GraphEdge>| {
        format!("penwidth = {} ", edge.weight().weight.min(8))
    };
    let node_attrs = |_: &Inner, (_, node): (NodeIndex, &GraphNode)| match &node.attrs {
        NodeAttrs::Folder(folder) => {
            let tooltip = format!("{} files, {} bytes", folder.file_count, folder.total_size);
            format!("shape = folder tooltip = {tooltip:?} ")
        }
        NodeAttrs::File(file) => format!("shape = box group = {:?} ", file.folder_group),
    };

    let body = Dot::with_attr_getters(
        graph.inner(),
        &[Config::GraphContentOnly],
        &edge_attrs,
        &node_attrs,
    );
    format!("digraph blendoc {{\n    rankdir = LR\n{body}}}\n")
}

#[derive(Serialize)]
struct JsonEdge<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(flatten)]
    edge: &'a GraphEdge,
}

#[derive(Serialize)]
struct JsonGraph<'a> {
    stats: GraphStats,
    nodes: Vec<&'a GraphNode>,
    edges: Vec<JsonEdge<'a>>,
}

/// Renders the graph with its statistics as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error only if serialization fails.
pub fn to_json(graph: &DependencyGraph) -> serde_json::Result<String> {
    let doc = JsonGraph {
        stats: graph.stats(),
        nodes: graph.nodes().collect(),
        edges: graph
            .edges()
            .map(|(source, target, edge)| JsonEdge {
                source,
                target,
                edge,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&doc)
}
