// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{earth_distance, Node};

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over node positions, used by [crate::Graph::find_nearest_node] to snap arbitrary
/// coordinates to the network without scanning every node.
///
/// Even levels of the tree split by latitude, odd levels split by longitude.
///
/// Distances are great-circle distances ([earth_distance]), while the branch pruning
/// measures the gap to the splitting line as if meridians were parallel. This is exact
/// for latitude splits, but may skip a closer node behind a longitude split when points
/// are close to the ante meridian (180°/-180° longitude) or poles (90°/-90° latitude),
/// or when the data spans multiple continents.
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: Node,
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

impl KDTree {
    /// Finds the closest [Node] to the given position.
    ///
    /// If multiple nodes are equally close, the first one encountered is returned.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Node {
        self.find_nearest_node_impl(lat, lon, false).0
    }

    fn find_nearest_node_impl(&self, lat: f64, lon: f64, lon_divides: bool) -> (Node, f64) {
        // Start by assuming that pivot is the closest
        let mut best = self.pivot;
        let mut best_dist = earth_distance(lat, lon, best.lat, best.lon);

        // Select which branch to recurse into first
        let first_left = if lon_divides {
            lon < best.lon
        } else {
            lat < best.lat
        };
        let (first, second) = if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        // Recurse into the first branch
        if let Some(ref branch) = first {
            let (alt, alt_dist) = branch.find_nearest_node_impl(lat, lon, !lon_divides);
            if alt_dist < best_dist {
                best = alt;
                best_dist = alt_dist;
            }
        }

        // (Optionally) recurse into the second branch
        if let Some(ref branch) = second {
            // A closer node is possible in the second branch if and only if
            // the splitting axis is closer than the current best candidate.
            let (axis_lat, axis_lon) = if lon_divides {
                (lat, self.pivot.lon)
            } else {
                (self.pivot.lat, lon)
            };
            let dist_to_axis = earth_distance(lat, lon, axis_lat, axis_lon);

            if dist_to_axis < best_dist {
                let (alt, alt_dist) = branch.find_nearest_node_impl(lat, lon, !lon_divides);
                if alt_dist < best_dist {
                    best = alt;
                    best_dist = alt_dist;
                }
            }
        }

        return (best, best_dist);
    }

    /// Returns the number of nodes stored in the tree.
    pub fn len(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |t| t.len()) + self.right.as_ref().map_or(0, |t| t.len())
    }

    /// Returns the number of levels of the tree.
    pub fn depth(&self) -> usize {
        1 + self
            .left
            .as_ref()
            .map_or(0, |t| t.depth())
            .max(self.right.as_ref().map_or(0, |t| t.depth()))
    }

    /// Builds a k-d tree from an iterable of [Nodes](Node).
    pub fn from_iter<I: IntoIterator<Item = Node>>(nodes: I) -> Option<Self> {
        let mut nodes = nodes.into_iter().collect::<Vec<_>>();
        Self::build(nodes.as_mut_slice())
    }

    /// Builds a k-d tree from a mutable slice of [Nodes](Node). Nodes will be reordered
    /// in the slice to facilitate building the tree.
    ///
    /// Returns `None` if the slice is empty.
    pub fn build(nodes: &mut [Node]) -> Option<Self> {
        Self::build_with_rng(nodes, &mut SmallRng::from_entropy())
    }

    /// Builds a k-d tree like [KDTree::build], drawing quickselect pivots from the provided
    /// random number generator.
    pub fn build_with_rng<R: Rng>(nodes: &mut [Node], rng: &mut R) -> Option<Self> {
        Self::build_impl(nodes, false, rng)
    }

    fn build_impl<R: Rng>(
        nodes: &mut [Node],
        lon_divides: bool,
        rng: &mut R,
    ) -> Option<Self> {
        match nodes.len() {
            0 => None,
            1 => Some(Self {
                pivot: nodes[0],
                left: None,
                right: None,
            }),
            _ => {
                let median = nodes.len() / 2;
                select_nth(nodes, median, lon_divides, rng);
                let pivot = nodes[median];
                let (left, right_and_pivot) = nodes.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: box_option(Self::build_impl(left, !lon_divides, rng)),
                    right: box_option(Self::build_impl(right, !lon_divides, rng)),
                })
            }
        }
    }
}

/// Reorders `nodes` so that `nodes[n]` is the node which would be at position `n`
/// if the slice was sorted by latitude (or longitude, if `lon_divides` is set).
/// All nodes before `n` compare less or equal, all nodes after `n` compare greater or equal.
///
/// Uses quickselect with uniformly random pivots and a three-way partition, so that
/// sorted input and repeated coordinates do not degrade to quadratic time.
fn select_nth<R: Rng>(nodes: &mut [Node], n: usize, lon_divides: bool, rng: &mut R) {
    let key = |node: &Node| if lon_divides { node.lon } else { node.lat };

    let mut lo = 0;
    let mut hi = nodes.len();

    while hi - lo > 1 {
        let pivot = key(&nodes[rng.gen_range(lo..hi)]);

        // nodes[lo..lt] < pivot, nodes[lt..i] == pivot, nodes[gt..hi] > pivot
        let mut lt = lo;
        let mut i = lo;
        let mut gt = hi;
        while i < gt {
            let value = key(&nodes[i]);
            if value < pivot {
                nodes.swap(lt, i);
                lt += 1;
                i += 1;
            } else if value > pivot {
                gt -= 1;
                nodes.swap(i, gt);
            } else {
                i += 1;
            }
        }

        if n < lt {
            hi = lt;
        } else if n >= gt {
            lo = gt;
        } else {
            return;
        }
    }
}

#[inline]
fn box_option<T>(o: Option<T>) -> Option<Box<T>> {
    o.map(|thing| Box::new(thing))
}
