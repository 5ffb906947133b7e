// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! C bindings.
//!
//! Node ids are passed as `size_t`. Distances are returned as `int64_t`,
//! with [NOT_FOUND] for unreachable targets and [INVALID_REFERENCE] for
//! ids outside of the graph (or for calls made before any search).
//!
//! A path finder borrows its graph - it must be deleted before the graph is.

use super::*;

use std::ffi::{c_char, CStr, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::ptr::null_mut;

/// Returned when the target is not reachable from the start.
pub const NOT_FOUND: i64 = -1;

/// Returned when a node doesn't exist, or when no search was run.
pub const INVALID_REFERENCE: i64 = -2;

fn distance_to_c(result: Result<Option<u64>, DijkstraError>) -> i64 {
    match result {
        Ok(Some(distance)) => i64::try_from(distance).unwrap_or(i64::MAX),
        Ok(None) => NOT_FOUND,
        Err(_) => INVALID_REFERENCE,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_graph_load(path: *const c_char) -> *mut Graph {
    if path.is_null() {
        return null_mut();
    }

    let path = OsStr::from_bytes(CStr::from_ptr(path).to_bytes());
    match fmi::load_from_file(path, &fmi::Options::default()) {
        Ok(g) => Box::into_raw(Box::new(g)),
        Err(e) => {
            log::error!("{}: {}", path.to_string_lossy(), e);
            null_mut()
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_graph_delete(ptr: *mut Graph) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_graph_len(graph: *const Graph) -> usize {
    graph.as_ref().map(|g| g.len()).unwrap_or(0)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_graph_get_node(graph: *const Graph, id: usize) -> Node {
    graph
        .as_ref()
        .and_then(|g| g.get_node(id))
        .unwrap_or(Node::INVALID)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_graph_find_nearest_node(
    graph: *const Graph,
    lat: f64,
    lon: f64,
) -> Node {
    graph
        .as_ref()
        .and_then(|g| g.find_nearest_node(lat, lon))
        .unwrap_or(Node::INVALID)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_path_finder_new(graph: *const Graph) -> *mut PathFinder<'static> {
    match graph.as_ref() {
        Some(g) => Box::into_raw(Box::new(g.path_finder())),
        None => null_mut(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_path_finder_delete(ptr: *mut PathFinder<'_>) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_shortest_path_distance(
    finder: *mut PathFinder<'_>,
    start: usize,
    target: usize,
) -> i64 {
    match finder.as_mut() {
        Some(finder) => distance_to_c(finder.shortest_path_distance(start, target)),
        None => INVALID_REFERENCE,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_shortest_paths_from(
    finder: *mut PathFinder<'_>,
    start: usize,
) -> bool {
    finder
        .as_mut()
        .map(|finder| finder.shortest_paths_from(start).is_ok())
        .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_distance_to(finder: *const PathFinder<'_>, target: usize) -> i64 {
    match finder.as_ref() {
        Some(finder) => distance_to_c(finder.distance_to(target)),
        None => INVALID_REFERENCE,
    }
}

/// Copies the path to `target` found by the last search into `out_nodes`
/// (at most `capacity` nodes), and returns the length of the whole path.
/// Zero is returned if there is no such path.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmiroute_path_to(
    finder: *const PathFinder<'_>,
    target: usize,
    out_nodes: *mut Node,
    capacity: usize,
) -> usize {
    let path = match finder.as_ref().map(|finder| finder.path_to(target)) {
        Some(Ok(path)) => path,
        _ => return 0,
    };

    if !out_nodes.is_null() {
        let n = path.len().min(capacity);
        std::ptr::copy_nonoverlapping(path.as_ptr(), out_nodes, n);
    }

    path.len()
}
