// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Shortest paths over large, static road networks stored in the FMI graph text format
//! (a few header lines, node and edge counts, then one node or edge per line).
//!
//! A network is loaded once into an immutable, compact [Graph] (edges grouped
//! by their source node, with an offsets index). While edges are being parsed,
//! a [KDTree] over node positions is built on a separate thread, so that
//! arbitrary coordinates can be snapped to the nearest node.
//!
//! Routing queries run plain [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
//! through a [PathFinder]. A [Graph] is freely shareable between threads,
//! every concurrent query should use its own [PathFinder].
//!
//! # Example
//!
//! ```no_run
//! let g = fmiroute::fmi::load_from_file("path/to/germany.fmi", &fmiroute::fmi::Options::default())
//!     .expect("failed to load germany.fmi");
//!
//! let start = g.find_nearest_node(48.7758, 9.1829).unwrap();
//! let end = g.find_nearest_node(52.5200, 13.4050).unwrap();
//!
//! let mut finder = g.path_finder();
//! match finder.shortest_path_distance(start.id, end.id).unwrap() {
//!     Some(distance) => println!("Distance: {}", distance),
//!     None => println!("No route"),
//! }
//! ```

pub mod c;
mod dijkstra;
mod distance;
pub mod fmi;
mod graph;
mod kd;

pub use dijkstra::{DijkstraError, PathFinder};
pub use distance::earth_distance;
pub use graph::Graph;
pub use kd::KDTree;

/// Represents an element of the [Graph].
///
/// Node ids are contiguous; a node's `id` is also its index in the [Graph].
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Node {
    pub id: usize,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    /// Placeholder used by the C bindings to signify absence of a node.
    pub const INVALID: Self = Self {
        id: usize::MAX,
        lat: f64::NAN,
        lon: f64::NAN,
    };
}

/// Represents a directed connection between two [Nodes](Node).
///
/// Weights are unsigned, which is what makes Dijkstra's algorithm applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub weight: u32,
}
