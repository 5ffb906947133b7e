use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use fmiroute::{self, fmi};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] fmi::ParseError);

#[derive(Debug, thiserror::Error)]
#[error("{0}:{1}: invalid query {2:?}")]
struct InvalidQuery(PathBuf, usize, String);

#[derive(Parser)]
struct Cli {
    /// The path to the graph file (plain, gzip or bzip2 compressed)
    graph_file: PathBuf,

    /// Latitude of a point to find the nearest node to
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of a point to find the nearest node to
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// The path to a file with one "source target" query per line
    #[arg(long)]
    que: Option<PathBuf>,

    /// Source node for a one-to-all search
    #[arg(long)]
    source: Option<usize>,

    /// Target node to print the one-to-all distance of
    #[arg(long, requires = "source")]
    target: Option<usize>,

    /// Print the route from source to target as GeoJSON
    #[arg(long, requires = "target")]
    geojson: bool,

    /// Number of header lines in the graph file
    #[arg(long, default_value_t = fmi::DEFAULT_HEADER_LINES)]
    header_lines: usize,

    /// Log more details (repeat for even more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    colog::default_builder()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let started = Instant::now();
    let g = load_graph(&cli.graph_file, cli.header_lines)?;
    log::info!("graph read took {:?}", started.elapsed());

    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        let started = Instant::now();
        let node = g
            .find_nearest_node(lat, lon)
            .ok_or("no node corresponding to the given position")?;
        log::info!("finding node took {:?}", started.elapsed());
        println!("nearest node: {} ({}, {})", node.id, node.lat, node.lon);
    }

    if let Some(ref que) = cli.que {
        let started = Instant::now();
        run_queries(&g, que)?;
        log::info!("processing {} took {:?}", que.display(), started.elapsed());
    }

    if let Some(source) = cli.source {
        let started = Instant::now();
        let mut finder = g.path_finder();
        finder.shortest_paths_from(source)?;
        log::info!("one-to-all search took {:?}", started.elapsed());

        if let Some(target) = cli.target {
            match finder.distance_to(target)? {
                Some(distance) => println!("distance from {} to {}: {}", source, target, distance),
                None => println!("no route from {} to {}", source, target),
            }

            if cli.geojson {
                print_geojson(&finder.path_to(target)?);
            }
        }
    }

    Ok(())
}

fn load_graph<P: AsRef<Path>>(path: P, header_lines: usize) -> Result<fmiroute::Graph, GraphLoadError> {
    let options = fmi::Options {
        header_lines,
        ..fmi::Options::default()
    };
    match fmi::load_from_file(path.as_ref(), &options) {
        Ok(g) => Ok(g),
        Err(e) => Err(GraphLoadError(PathBuf::from(path.as_ref()), e)),
    }
}

/// Runs a one-to-one search for every "source target" line of the file,
/// printing the distance (or -1 if there is no route).
fn run_queries(g: &fmiroute::Graph, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut finder = g.path_finder();
    let reader = io::BufReader::new(File::open(path)?);

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let ids = line
            .split_whitespace()
            .map(|s| s.parse::<usize>())
            .collect::<Result<Vec<_>, _>>();
        let (start, target) = match ids.as_deref() {
            Ok(&[start, target]) => (start, target),
            _ => return Err(InvalidQuery(path.to_path_buf(), idx + 1, line).into()),
        };

        match finder.shortest_path_distance(start, target)? {
            Some(distance) => println!("{}", distance),
            None => println!("-1"),
        }
    }

    Ok(())
}

fn print_geojson(route: &[fmiroute::Node]) {
    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{}},");

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut nodes = route.iter().peekable();
    while let Some(node) = nodes.next() {
        let suffix = if nodes.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", node.lon, node.lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");
}
