// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::str::FromStr;
use std::time::Instant;

use super::{ParseError, Reason};
use crate::graph::{assemble, check_edge, check_node};
use crate::{Edge, Graph, Node};

/// Upper bound on the number of records reserved up-front. Counts come from the file
/// itself, so larger inputs grow the buffers as records are actually read.
const MAX_PREALLOCATED: usize = 1 << 20;

/// Line-oriented reader of the FMI graph format:
///
/// ```text
/// <header_lines ignored lines>
/// N
/// M
/// N lines: id ignored lat lon ...
/// M lines: from to weight ...
/// ```
pub(super) struct Parser<R: io::BufRead> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: io::BufRead> Parser<R> {
    pub(super) fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::default(),
            line_no: 0,
        }
    }

    /// Reads the whole input into a [Graph].
    pub(super) fn parse(mut self, header_lines: usize) -> Result<Graph, ParseError> {
        let start = Instant::now();

        for _ in 0..header_lines {
            self.advance()?;
        }

        let node_count = self.read_count("node count")?;
        let edge_count = self.read_count("edge count")?;
        log::debug!("reading {} nodes and {} edges", node_count, edge_count);

        let mut nodes = Vec::with_capacity(node_count.min(MAX_PREALLOCATED));
        for id in 0..node_count {
            nodes.push(self.read_node(id)?);
        }
        log::debug!("nodes read in {:?}", start.elapsed());

        let g = assemble(nodes, || {
            let mut edges = Vec::with_capacity(edge_count.min(MAX_PREALLOCATED));
            for _ in 0..edge_count {
                edges.push(self.read_edge(node_count)?);
            }
            self.expect_end()?;
            Ok(edges)
        })?;

        log::info!(
            "loaded {} nodes and {} edges in {:?}",
            g.len(),
            g.edge_count(),
            start.elapsed()
        );
        Ok(g)
    }

    fn read_count(&mut self, field: &'static str) -> Result<usize, ParseError> {
        self.advance()?;
        let mut fields = self.line.split_whitespace();
        self.parse_field(fields.next(), field)
    }

    fn read_node(&mut self, expected_id: usize) -> Result<Node, ParseError> {
        self.advance()?;
        let mut fields = self.line.split_whitespace();

        let id = self.parse_field(fields.next(), "node id")?;
        fields.next(); // OSM id
        let lat = self.parse_field(fields.next(), "latitude")?;
        let lon = self.parse_field(fields.next(), "longitude")?;

        let node = Node { id, lat, lon };
        check_node(expected_id, &node).map_err(|r| self.error(r))?;
        Ok(node)
    }

    fn read_edge(&mut self, node_count: usize) -> Result<Edge, ParseError> {
        self.advance()?;
        let mut fields = self.line.split_whitespace();

        let from = self.parse_field(fields.next(), "source node")?;
        let to = self.parse_field(fields.next(), "target node")?;
        let weight: i64 = self.parse_field(fields.next(), "weight")?;

        if weight < 0 {
            return Err(self.error(Reason::NegativeWeight(weight)));
        }
        let weight = u32::try_from(weight).map_err(|_| {
            self.error(Reason::InvalidNumber {
                field: "weight",
                value: weight.to_string(),
            })
        })?;

        let edge = Edge { from, to, weight };
        check_edge(&edge, node_count).map_err(|r| self.error(r))?;
        Ok(edge)
    }

    /// Ensures that nothing but blank lines follows the last edge.
    fn expect_end(&mut self) -> Result<(), ParseError> {
        loop {
            self.line.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return Ok(()),
                Ok(_) if self.line.trim().is_empty() => {
                    log::trace!("ignoring blank line {}", self.line_no);
                }
                Ok(_) => return Err(self.error(Reason::TrailingData)),
                Err(e) => return Err(self.error(Reason::Io(e))),
            }
        }
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.line.clear();
        self.line_no += 1;
        match self.reader.read_line(&mut self.line) {
            Ok(0) => Err(self.error(Reason::UnexpectedEof)),
            Ok(_) => Ok(()),
            Err(e) => Err(self.error(Reason::Io(e))),
        }
    }

    fn parse_field<T: FromStr>(
        &self,
        raw: Option<&str>,
        field: &'static str,
    ) -> Result<T, ParseError> {
        let raw = raw.ok_or_else(|| self.error(Reason::MissingField(field)))?;
        raw.parse().map_err(|_| {
            self.error(Reason::InvalidNumber {
                field,
                value: raw.to_string(),
            })
        })
    }

    fn error(&self, reason: Reason) -> ParseError {
        ParseError::new(reason, format!("line {}", self.line_no))
    }
}
