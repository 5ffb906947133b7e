// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::thread;
use std::time::Instant;

use crate::fmi::{ParseError, Reason};
use crate::{Edge, KDTree, Node, PathFinder};

/// Represents a road network as an immutable set of [Nodes](Node)
/// and directed [Edges](Edge) between them.
///
/// Edges are stored in a single array grouped by their source node, with
/// `offsets[id]..offsets[id + 1]` delimiting the edges leaving node `id`
/// (the "compressed sparse row" layout). A [KDTree] over all nodes is built
/// alongside the graph and used by [Graph::find_nearest_node].
///
/// A Graph is never mutated after construction, and can be shared
/// between threads without any locking.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    offsets: Vec<usize>,
    edges: Vec<Edge>,
    tree: Option<KDTree>,
}

impl Graph {
    /// Creates a graph from in-memory nodes and edges.
    ///
    /// `nodes[i].id` must be equal to `i`, and all edges must reference existing nodes.
    /// Edges don't need to be sorted - they are grouped by their source node,
    /// preserving the relative order of edges leaving the same node.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, ParseError> {
        for (idx, node) in nodes.iter().enumerate() {
            check_node(idx, node).map_err(|r| ParseError::new(r, format!("node {}", idx)))?;
        }

        let n = nodes.len();
        assemble(nodes, move || {
            for (idx, edge) in edges.iter().enumerate() {
                check_edge(edge, n).map_err(|r| ParseError::new(r, format!("edge {}", idx)))?;
            }
            Ok(edges)
        })
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns all [Nodes](Node) in the graph, indexed by their id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all [Edges](Edge) in the graph, grouped by their source node.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the offsets index, which has exactly `len() + 1` elements.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: usize) -> Option<Node> {
        self.nodes.get(id).copied()
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    /// Returns an empty slice for non-existing nodes.
    pub fn get_edges(&self, from_id: usize) -> &[Edge] {
        if from_id < self.nodes.len() {
            &self.edges[self.offsets[from_id]..self.offsets[from_id + 1]]
        } else {
            &[]
        }
    }

    /// Finds the closest [Node] to the given position, using the
    /// [KDTree] built while the graph was loaded.
    ///
    /// Returns `None` only if the graph has no nodes.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        self.tree.as_ref().map(|t| t.find_nearest_node(lat, lon))
    }

    /// Creates a new [PathFinder] over this graph.
    ///
    /// Every concurrently executed query needs its own [PathFinder].
    pub fn path_finder(&self) -> PathFinder<'_> {
        PathFinder::new(self)
    }
}

/// Builds a [Graph] from already validated nodes.
///
/// The [KDTree] is built on a separate thread, while `read_edges` runs on the calling thread
/// and its edges are grouped by source node. Both have to succeed for a graph to be returned.
pub(crate) fn assemble<F>(nodes: Vec<Node>, read_edges: F) -> Result<Graph, ParseError>
where
    F: FnOnce() -> Result<Vec<Edge>, ParseError>,
{
    assemble_with(nodes, |nodes| KDTree::from_iter(nodes.iter().copied()), read_edges)
}

fn assemble_with<B, F>(nodes: Vec<Node>, build_tree: B, read_edges: F) -> Result<Graph, ParseError>
where
    B: FnOnce(&[Node]) -> Option<KDTree> + Send,
    F: FnOnce() -> Result<Vec<Edge>, ParseError>,
{
    let (tree, csr) = thread::scope(|s| {
        let tree_builder = thread::Builder::new()
            .name("kd-tree-builder".to_string())
            .spawn_scoped(s, || {
                let start = Instant::now();
                let tree = build_tree(&nodes);
                log::debug!("k-d tree over {} nodes built in {:?}", nodes.len(), start.elapsed());
                tree
            })
            .map_err(|e| ParseError::new(Reason::Io(e), "spawning k-d tree builder"))?;

        let csr = read_edges().map(|edges| group_by_source(nodes.len(), edges));

        let tree = tree_builder
            .join()
            .map_err(|_| ParseError::new(Reason::SpatialIndex, "k-d tree builder"))?;

        Ok::<_, ParseError>((tree, csr?))
    })?;

    let (offsets, edges) = csr;
    debug_assert_eq!(offsets.len(), nodes.len() + 1);
    debug_assert_eq!(offsets.last().copied(), Some(edges.len()));

    Ok(Graph {
        nodes,
        offsets,
        edges,
        tree,
    })
}

/// Sorts `edges` by their source node (stable counting sort) and returns them
/// alongside the offsets index.
fn group_by_source(node_count: usize, edges: Vec<Edge>) -> (Vec<usize>, Vec<Edge>) {
    // offsets[i + 1] = number of edges leaving node i
    let mut offsets = vec![0; node_count + 1];
    for edge in &edges {
        offsets[edge.from + 1] += 1;
    }

    // offsets[i] = number of edges leaving nodes < i
    for i in 1..offsets.len() {
        offsets[i] += offsets[i - 1];
    }

    if edges.windows(2).all(|w| w[0].from <= w[1].from) {
        return (offsets, edges);
    }

    log::debug!("edges are not grouped by source node - sorting");
    let mut next = offsets.clone();
    let mut grouped = vec![
        Edge {
            from: 0,
            to: 0,
            weight: 0,
        };
        edges.len()
    ];
    for edge in edges {
        grouped[next[edge.from]] = edge;
        next[edge.from] += 1;
    }

    (offsets, grouped)
}

pub(crate) fn check_node(expected_id: usize, node: &Node) -> Result<(), Reason> {
    if node.id != expected_id {
        Err(Reason::NodeIdMismatch {
            expected: expected_id,
            got: node.id,
        })
    } else if !(-90.0..=90.0).contains(&node.lat) {
        Err(Reason::InvalidCoordinate {
            field: "latitude",
            value: node.lat,
        })
    } else if !(-180.0..=180.0).contains(&node.lon) {
        Err(Reason::InvalidCoordinate {
            field: "longitude",
            value: node.lon,
        })
    } else {
        Ok(())
    }
}

pub(crate) fn check_edge(edge: &Edge, node_count: usize) -> Result<(), Reason> {
    for id in [edge.from, edge.to] {
        if id >= node_count {
            return Err(Reason::NodeOutOfRange {
                id,
                count: node_count,
            });
        }
    }
    Ok(())
}
