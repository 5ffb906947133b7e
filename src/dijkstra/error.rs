// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Error conditions which may occur when querying a [PathFinder](crate::PathFinder).
///
/// Note that an unreachable target is not an error - it is reported as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DijkstraError {
    /// The start or target node doesn't exist in a graph.
    InvalidReference(usize),

    /// Distances were requested before any search was run.
    NoSearch,
}

impl std::fmt::Display for DijkstraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReference(node_id) => write!(f, "invalid node: {}", node_id),
            Self::NoSearch => write!(f, "no search has been run yet"),
        }
    }
}

impl std::error::Error for DijkstraError {}
