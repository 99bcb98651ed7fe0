use super::hasher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Spatial anchor for one directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Galaxy {
    /// Repository-relative directory path ("" for the root)
    pub path: String,
    /// Number of distinct files located under this directory so far
    pub file_count: usize,
    pub x: u16,
    pub y: u16,
    pub scale: u32,
}

impl Galaxy {
    fn new(path: &str) -> Self {
        let (x, y, scale) = hasher::anchor_for(path);
        Self {
            path: path.to_string(),
            file_count: 0,
            x,
            y,
            scale,
        }
    }
}

/// Directory path -> anchor, grown monotonically for the lifetime of a run
#[derive(Debug, Default)]
pub struct GalaxyRegistry {
    galaxies: HashMap<String, Galaxy>,
}

impl GalaxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the anchor for `path`, creating it on first access
    pub fn get(&mut self, path: &str) -> &Galaxy {
        self.galaxies
            .entry(path.to_string())
            .or_insert_with(|| Galaxy::new(path))
    }

    /// Record one more distinct file under `path`; position is unchanged
    pub fn touch(&mut self, path: &str) {
        self.galaxies
            .entry(path.to_string())
            .or_insert_with(|| Galaxy::new(path))
            .file_count += 1;
    }

    /// Look up an anchor without creating it
    pub fn peek(&self, path: &str) -> Option<&Galaxy> {
        self.galaxies.get(path)
    }

    pub fn len(&self) -> usize {
        self.galaxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.galaxies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Galaxy> {
        self.galaxies.values()
    }
}
