// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod error;
mod heap;
mod path_finder;

pub use error::DijkstraError;
pub use path_finder::PathFinder;
