// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading [Graphs](crate::Graph) from the FMI text format.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use parser::Parser;

use crate::Graph;

mod error;
mod parser;

pub use error::{ParseError, Reason};

/// Number of header lines in FMI files produced by the OSM graph extractor.
pub const DEFAULT_HEADER_LINES: usize = 5;

/// Format of the input graph file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    Unknown,

    /// Force uncompressed text
    Plain,

    /// Force [gzip](https://en.wikipedia.org/wiki/Gzip) compressed text
    Gz,

    /// Force [bzip2](https://en.wikipedia.org/wiki/Bzip2) compressed text
    Bz2,
}

/// Additional controls for loading a [Graph].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// Number of lines to skip before the node count.
    pub header_lines: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            file_format: FileFormat::Unknown,
            header_lines: DEFAULT_HEADER_LINES,
        }
    }
}

/// Load a [Graph] from a reader as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader.
pub fn load_from_io<R: io::Read>(reader: R, options: &Options) -> Result<Graph, ParseError> {
    let mut b = io::BufReader::new(reader);

    let file_format = match options.file_format {
        FileFormat::Unknown => detect_format(&mut b)?,
        f => f,
    };

    match file_format {
        FileFormat::Unknown | FileFormat::Plain => Parser::new(b).parse(options.header_lines),

        FileFormat::Gz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            Parser::new(io::BufReader::new(d)).parse(options.header_lines)
        }

        FileFormat::Bz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            Parser::new(io::BufReader::new(d)).parse(options.header_lines)
        }
    }
}

/// Load a [Graph] from a file at the provided path as per the provided [Options].
pub fn load_from_file<P: AsRef<Path>>(path: P, options: &Options) -> Result<Graph, ParseError> {
    let path = path.as_ref();
    log::info!("loading graph from {}", path.display());
    let f = File::open(path).map_err(|e| ParseError::new(Reason::Io(e), path.display().to_string()))?;
    load_from_io(f, options)
}

/// Load a [Graph] from a static buffer as per the provided [Options].
pub fn load_from_buffer(data: &[u8], options: &Options) -> Result<Graph, ParseError> {
    if options.file_format == FileFormat::Plain {
        // In-memory text doesn't need any buffering
        Parser::new(data).parse(options.header_lines)
    } else {
        load_from_io(data, options)
    }
}

/// Guesses the [FileFormat] by looking at the magic bytes at the start of the stream,
/// without consuming them.
fn detect_format<R: BufRead>(reader: &mut R) -> Result<FileFormat, ParseError> {
    let head = reader
        .fill_buf()
        .map_err(|e| ParseError::new(Reason::Io(e), "detecting file format"))?;

    let format = if head.starts_with(&[0x1f, 0x8b]) {
        FileFormat::Gz
    } else if head.starts_with(b"BZh") {
        FileFormat::Bz2
    } else {
        FileFormat::Plain
    };

    log::debug!("detected file format: {:?}", format);
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = include_bytes!("test_fixtures/simple.fmi");
    const SIMPLE_GZ: &[u8] = include_bytes!("test_fixtures/simple.fmi.gz");
    const SIMPLE_BZ2: &[u8] = include_bytes!("test_fixtures/simple.fmi.bz2");

    const HEADER: &str = "# Id : 0\n# Timestamp : 0\n# Type: maxspeed\n# Revision: 1\n\n";

    fn options(file_format: FileFormat) -> Options {
        Options {
            file_format,
            ..Options::default()
        }
    }

    fn load_text(body: &str) -> Result<Graph, ParseError> {
        let data = format!("{}{}", HEADER, body);
        load_from_buffer(data.as_bytes(), &options(FileFormat::Plain))
    }

    fn check_simple_graph(g: &Graph) {
        //  2        3
        //  ↑ ╲      ↑
        //  3   1    2
        //  │     ↘  │
        //  0 ──5──→ 1
        assert_eq!(g.len(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.offsets(), &[0, 2, 3, 4, 4]);

        let n = g.get_node(3).unwrap();
        assert_eq!((n.lat, n.lon), (1.0, 1.0));

        let mut finder = g.path_finder();
        assert_eq!(finder.shortest_path_distance(0, 3), Ok(Some(6)));
        assert_eq!(finder.shortest_path_distance(0, 1), Ok(Some(4)));
        assert_eq!(finder.shortest_path_distance(3, 0), Ok(None));

        assert_eq!(g.find_nearest_node(0.1, 0.9).map(|n| n.id), Some(1));
    }

    #[test]
    fn plain() {
        let g = load_from_buffer(SIMPLE, &options(FileFormat::Plain)).unwrap();
        check_simple_graph(&g);
    }

    #[test]
    fn gz() {
        let g = load_from_buffer(SIMPLE_GZ, &options(FileFormat::Gz)).unwrap();
        check_simple_graph(&g);
    }

    #[test]
    fn bz2() {
        let g = load_from_buffer(SIMPLE_BZ2, &options(FileFormat::Bz2)).unwrap();
        check_simple_graph(&g);
    }

    #[test]
    fn detected_formats() {
        for data in [SIMPLE, SIMPLE_GZ, SIMPLE_BZ2] {
            let g = load_from_buffer(data, &Options::default()).unwrap();
            check_simple_graph(&g);
        }
    }

    #[test]
    fn custom_header_lines() {
        let data = "only one header line\n2\n1\n0 0 0.5 0.5\n1 0 0.6 0.6\n0 1 7\n";
        let g = load_from_buffer(
            data.as_bytes(),
            &Options {
                file_format: FileFormat::Plain,
                header_lines: 1,
            },
        )
        .unwrap();

        assert_eq!(g.len(), 2);
        assert_eq!(g.get_edges(0).len(), 1);
        assert_eq!(g.get_edges(0)[0].weight, 7);
    }

    #[test]
    fn extra_fields_and_whitespace() {
        let g = load_text("2\n2\n0  123 48.5\t9.1 250 extra\n1 124 48.6 9.2\n1 0 10 2 50\n0 1 10\n\n\n")
            .unwrap();

        assert_eq!(g.len(), 2);
        assert_eq!(g.get_node(0).map(|n| n.lon), Some(9.1));
        assert_eq!(g.offsets(), &[0, 1, 2]);
        assert_eq!(g.get_edges(1)[0].to, 0);
    }

    #[test]
    fn empty_graph() {
        let g = load_text("0\n0\n").unwrap();
        assert!(g.is_empty());
        assert_eq!(g.offsets(), &[0]);
        assert_eq!(g.find_nearest_node(0.0, 0.0), None);
    }

    #[test]
    fn truncated() {
        let err = load_text("2\n1\n0 0 48.5 9.1\n").unwrap_err();
        assert!(matches!(err.reason, Reason::UnexpectedEof));
        assert_eq!(err.context, "line 9");

        let err = load_text("2\n1\n0 0 48.5 9.1\n1 0 48.6 9.2\n").unwrap_err();
        assert!(matches!(err.reason, Reason::UnexpectedEof));
        assert_eq!(err.context, "line 10");

        let err = load_from_buffer(b"# header\n", &options(FileFormat::Plain)).unwrap_err();
        assert!(matches!(err.reason, Reason::UnexpectedEof));

        // Declared counts far beyond the actual content
        let err = load_text("99999999999999999\n0\n").unwrap_err();
        assert!(matches!(err.reason, Reason::UnexpectedEof));
        assert_eq!(err.context, "line 8");

        let err = load_text("1\n99999999999999999\n0 0 48.5 9.1\n").unwrap_err();
        assert!(matches!(err.reason, Reason::UnexpectedEof));
        assert_eq!(err.context, "line 9");
    }

    #[test]
    fn invalid_numbers() {
        let err = load_text("two\n1\n").unwrap_err();
        assert!(matches!(
            err.reason,
            Reason::InvalidNumber { field: "node count", .. }
        ));
        assert_eq!(err.context, "line 6");

        let err = load_text("1\n0\n0 0 north 9.1\n").unwrap_err();
        assert!(matches!(
            err.reason,
            Reason::InvalidNumber { field: "latitude", .. }
        ));

        let err = load_text("1\n0\n0 0 48.5\n").unwrap_err();
        assert!(matches!(err.reason, Reason::MissingField("longitude")));

        let err = load_text("1\n1\n0 0 48.5 9.1\n0 0 1.5\n").unwrap_err();
        assert!(matches!(
            err.reason,
            Reason::InvalidNumber { field: "weight", .. }
        ));
    }

    #[test]
    fn invalid_graphs() {
        let err = load_text("2\n0\n0 0 48.5 9.1\n2 0 48.6 9.2\n").unwrap_err();
        assert!(matches!(
            err.reason,
            Reason::NodeIdMismatch {
                expected: 1,
                got: 2
            }
        ));

        let err = load_text("1\n0\n0 0 148.5 9.1\n").unwrap_err();
        assert!(matches!(
            err.reason,
            Reason::InvalidCoordinate {
                field: "latitude",
                ..
            }
        ));

        let err = load_text("1\n1\n0 0 48.5 9.1\n0 1 5\n").unwrap_err();
        assert!(matches!(
            err.reason,
            Reason::NodeOutOfRange { id: 1, count: 1 }
        ));

        let err = load_text("1\n1\n0 0 48.5 9.1\n0 0 -5\n").unwrap_err();
        assert!(matches!(err.reason, Reason::NegativeWeight(-5)));
        assert_eq!(err.context, "line 9");

        let err = load_text("1\n1\n0 0 48.5 9.1\n0 0 5\n0 0 6\n").unwrap_err();
        assert!(matches!(err.reason, Reason::TrailingData));
        assert_eq!(err.context, "line 10");
    }

    #[test]
    fn missing_file() {
        let err = load_from_file("this/file/does/not/exist.fmi", &Options::default()).unwrap_err();
        assert!(matches!(err.reason, Reason::Io(_)));
        assert_eq!(err.context, "this/file/does/not/exist.fmi");
    }

    #[test]
    fn error_message() {
        let err = load_text("1\n1\n0 0 48.5 9.1\n0 3 5\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 9: node 3 does not exist (graph has 1 nodes)"
        );
    }
}
