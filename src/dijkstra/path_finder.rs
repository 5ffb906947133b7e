// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::heap::IndexedMinHeap;
use crate::{DijkstraError, Edge, Graph, Node};

const UNREACHED: u64 = u64::MAX;
const NO_PREDECESSOR: usize = usize::MAX;

/// Runs [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// over a shared [Graph].
///
/// A PathFinder owns all the working state of a search (distances, predecessors,
/// settled nodes and the priority queue), so it must not be shared between
/// concurrent queries; create one per query (or per worker thread) with
/// [Graph::path_finder]. The state is reset at the start of every search, and
/// the results of the last search remain available through [PathFinder::distance_to]
/// and [PathFinder::path_to].
///
/// If multiple shortest paths of equal cost exist, the one discovered first is kept.
#[derive(Debug, Clone)]
pub struct PathFinder<'a> {
    g: &'a Graph,
    distances: Vec<u64>,
    predecessors: Vec<usize>,
    settled: Vec<u64>,
    queue: IndexedMinHeap,
    searched: bool,
}

impl<'a> PathFinder<'a> {
    pub fn new(g: &'a Graph) -> Self {
        let n = g.len();
        Self {
            g,
            distances: vec![UNREACHED; n],
            predecessors: vec![NO_PREDECESSOR; n],
            settled: vec![0; n.div_ceil(64)],
            queue: IndexedMinHeap::with_capacity(n),
            searched: false,
        }
    }

    /// Returns the [Graph] this PathFinder searches over.
    pub fn graph(&self) -> &'a Graph {
        self.g
    }

    /// Finds the cost of the shortest path from `start` to `target`.
    ///
    /// Returns `Ok(None)` if `target` is not reachable from `start`, and
    /// [DijkstraError::InvalidReference] if either node doesn't exist.
    ///
    /// The search stops as soon as `target` is settled, thus afterwards
    /// [PathFinder::distance_to] only knows about nodes closer than `target`.
    pub fn shortest_path_distance(
        &mut self,
        start: usize,
        target: usize,
    ) -> Result<Option<u64>, DijkstraError> {
        self.check_reference(start)?;
        self.check_reference(target)?;
        self.reset(start);

        while let Some(at) = self.queue.pop(&self.distances) {
            self.settle(at);
            if at == target {
                return Ok(Some(self.distances[at]));
            }
            self.relax_edges_from(at);
        }

        Ok(None)
    }

    /// Finds the costs of the shortest paths from `start` to all other nodes,
    /// which can then be retrieved with [PathFinder::distance_to] and [PathFinder::path_to].
    ///
    /// Returns [DijkstraError::InvalidReference] if `start` doesn't exist.
    pub fn shortest_paths_from(&mut self, start: usize) -> Result<(), DijkstraError> {
        self.check_reference(start)?;
        self.reset(start);

        let mut settled_count = 0;
        while let Some(at) = self.queue.pop(&self.distances) {
            self.settle(at);
            self.relax_edges_from(at);
            settled_count += 1;
        }

        log::trace!("{} nodes reachable from {}", settled_count, start);
        Ok(())
    }

    /// Returns the cost of the shortest path to `target` found by the last search,
    /// or `None` if `target` was not reached (settled) by it.
    pub fn distance_to(&self, target: usize) -> Result<Option<u64>, DijkstraError> {
        self.check_searched(target)?;
        if self.is_settled(target) {
            Ok(Some(self.distances[target]))
        } else {
            Ok(None)
        }
    }

    /// Returns the [Nodes](Node) along the shortest path to `target` found by the last search,
    /// starting with the start node and ending with `target`.
    ///
    /// Returns an empty vector if `target` was not reached (settled) by the last search.
    pub fn path_to(&self, target: usize) -> Result<Vec<Node>, DijkstraError> {
        self.check_searched(target)?;
        if !self.is_settled(target) {
            return Ok(vec![]);
        }

        let nodes = self.g.nodes();
        let mut path = vec![nodes[target]];
        let mut at = target;
        while self.predecessors[at] != NO_PREDECESSOR {
            at = self.predecessors[at];
            path.push(nodes[at]);
        }

        path.reverse();
        return Ok(path);
    }

    fn check_reference(&self, id: usize) -> Result<(), DijkstraError> {
        if id < self.g.len() {
            Ok(())
        } else {
            Err(DijkstraError::InvalidReference(id))
        }
    }

    fn check_searched(&self, id: usize) -> Result<(), DijkstraError> {
        self.check_reference(id)?;
        if self.searched {
            Ok(())
        } else {
            Err(DijkstraError::NoSearch)
        }
    }

    fn reset(&mut self, start: usize) {
        self.distances.fill(UNREACHED);
        self.predecessors.fill(NO_PREDECESSOR);
        self.settled.fill(0);
        self.queue.clear();
        self.searched = true;

        self.distances[start] = 0;
        self.queue.push(start, &self.distances);
    }

    fn relax_edges_from(&mut self, at: usize) {
        let g = self.g;
        let base = self.distances[at];
        debug_assert_ne!(base, UNREACHED);

        for &Edge { to, weight, .. } in g.get_edges(at) {
            if self.is_settled(to) {
                continue;
            }

            // Only strictly better paths replace a known one
            let alt = base + weight as u64;
            if alt < self.distances[to] {
                self.distances[to] = alt;
                self.predecessors[to] = at;
                self.queue.push_or_decrease(to, &self.distances);
            }
        }
    }

    #[inline]
    fn is_settled(&self, id: usize) -> bool {
        self.settled[id / 64] & (1 << (id % 64)) != 0
    }

    #[inline]
    fn settle(&mut self, id: usize) {
        self.settled[id / 64] |= 1 << (id % 64);
    }
}
