//! Deterministic star-map coordinates for repository paths
//!
//! Every directory becomes a galaxy anchored by a hash of its path, and every
//! file a star offset from that anchor by a hash of its name.

/// Directory anchors
pub mod galaxy;
/// BLAKE2b-based coordinate hashing
pub mod hasher;
/// Memoized file positions and categories
pub mod star;

pub use galaxy::{Galaxy, GalaxyRegistry};
pub use star::{Star, StarLocator};

use std::sync::Arc;

/// Spatial state for one extraction run
///
/// Owned by the run that creates it; nothing here is global.
#[derive(Debug, Default)]
pub struct Sky {
    pub galaxies: GalaxyRegistry,
    pub stars: StarLocator,
}

impl Sky {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate a repository-relative path, splitting it at the last `/`
    pub fn locate_path(&mut self, path: &str) -> Arc<Star> {
        let (dir, name) = split_path(path);
        self.locate(dir, name)
    }

    pub fn locate(&mut self, dir: &str, name: &str) -> Arc<Star> {
        self.stars.locate(&mut self.galaxies, dir, name)
    }
}

/// Split a path into `(directory, file name)`; no slash means the root directory
pub fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}
