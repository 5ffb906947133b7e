// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;

/// Error returned when a [Graph](crate::Graph) can't be loaded.
///
/// No partially loaded graph is ever returned alongside an error.
#[derive(Debug, thiserror::Error)]
#[error("{context}: {reason}")]
pub struct ParseError {
    /// What went wrong.
    #[source]
    pub reason: Reason,

    /// Where it went wrong, e.g. `line 12`.
    pub context: String,
}

impl ParseError {
    pub fn new<S: Into<String>>(reason: Reason, context: S) -> Self {
        Self {
            reason,
            context: context.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Reason {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} out of range: {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },

    #[error("expected node {expected}, got node {got}")]
    NodeIdMismatch { expected: usize, got: usize },

    #[error("node {id} does not exist (graph has {count} nodes)")]
    NodeOutOfRange { id: usize, count: usize },

    #[error("negative edge weight: {0}")]
    NegativeWeight(i64),

    #[error("unexpected data after the last edge")]
    TrailingData,

    #[error("k-d tree construction failed")]
    SpatialIndex,
}
