use super::galaxy::GalaxyRegistry;
use super::hasher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Category reserved for anything that looks like test code
pub const TEST_CATEGORY: &str = "test";

/// Final position of one file
///
/// Serialized in the compact shape the renderer reads:
/// `{x, y, n: name, c: category, g: directory}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "c")]
    pub category: String,
    #[serde(rename = "g")]
    pub galaxy: String,
}

/// Category for a file: lowercased extension, or `test` if the path mentions it
pub fn categorize(dir: &str, name: &str) -> String {
    let full = format!("{}/{}", dir, name).to_lowercase();
    if full.contains(TEST_CATEGORY) {
        return TEST_CATEGORY.to_string();
    }
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Memoizing resolver from `(directory, file name)` to a [`Star`]
#[derive(Debug, Default)]
pub struct StarLocator {
    stars: HashMap<(String, String), Arc<Star>>,
}

impl StarLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate a file, computing its position on first sight
    ///
    /// Repeated calls hand back the same allocation. The first call for a
    /// pair also counts the file against its directory.
    pub fn locate(&mut self, galaxies: &mut GalaxyRegistry, dir: &str, name: &str) -> Arc<Star> {
        let key = (dir.to_string(), name.to_string());
        if let Some(star) = self.stars.get(&key) {
            return Arc::clone(star);
        }

        let galaxy = galaxies.get(dir);
        let (dx, dy) = hasher::offset_for(galaxy.scale, name);
        let star = Arc::new(Star {
            x: (f64::from(galaxy.x) + dx) as i32,
            y: (f64::from(galaxy.y) + dy) as i32,
            name: name.to_string(),
            category: categorize(dir, name),
            galaxy: dir.to_string(),
        });
        galaxies.touch(dir);

        self.stars.insert(key, Arc::clone(&star));
        star
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_is_memoized() {
        let mut galaxies = GalaxyRegistry::new();
        let mut locator = StarLocator::new();

        let first = locator.locate(&mut galaxies, "src/main", "App.java");
        let second = locator.locate(&mut galaxies, "src/main", "App.java");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(locator.len(), 1);
        assert_eq!(galaxies.peek("src/main").unwrap().file_count, 1);
    }

    #[test]
    fn test_locate_matches_fresh_computation() {
        let mut galaxies = GalaxyRegistry::new();
        let mut locator = StarLocator::new();
        let star = locator.locate(&mut galaxies, "src/main", "App.java");

        let (ax, ay, scale) = hasher::anchor_for("src/main");
        let (dx, dy) = hasher::offset_for(scale, "App.java");
        assert_eq!(star.x, (f64::from(ax) + dx) as i32);
        assert_eq!(star.y, (f64::from(ay) + dy) as i32);
        assert_eq!(star.galaxy, "src/main");
        assert_eq!(star.category, "java");
    }

    #[test]
    fn test_same_pair_same_star_across_locators() {
        let mut g1 = GalaxyRegistry::new();
        let mut l1 = StarLocator::new();
        l1.locate(&mut g1, "other", "x.rs");
        let a = l1.locate(&mut g1, "src", "lib.rs");

        let mut g2 = GalaxyRegistry::new();
        let mut l2 = StarLocator::new();
        let b = l2.locate(&mut g2, "src", "lib.rs");

        assert_eq!(*a, *b);
    }

    #[test]
    fn test_distinct_files_increment_count() {
        let mut galaxies = GalaxyRegistry::new();
        let mut locator = StarLocator::new();
        locator.locate(&mut galaxies, "src", "a.rs");
        locator.locate(&mut galaxies, "src", "b.rs");
        locator.locate(&mut galaxies, "src", "a.rs");
        assert_eq!(galaxies.peek("src").unwrap().file_count, 2);
    }

    #[test]
    fn test_empty_inputs() {
        let mut galaxies = GalaxyRegistry::new();
        let mut locator = StarLocator::new();
        let star = locator.locate(&mut galaxies, "", "");
        assert_eq!(star.name, "");
        assert_eq!(star.galaxy, "");
        assert_eq!(star.category, "");
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("src", "Main.RS"), "rs");
        assert_eq!(categorize("src", "Makefile"), "");
        assert_eq!(categorize("src", ".gitignore"), "");
        assert_eq!(categorize("src/Tests", "helper.rs"), "test");
        assert_eq!(categorize("src", "AppTest.java"), "test");
        assert_eq!(categorize("", "archive.tar.GZ"), "gz");
    }

    #[test]
    fn test_star_serializes_compact_keys() {
        let star = Star {
            x: 10,
            y: -3,
            name: "App.java".to_string(),
            category: "java".to_string(),
            galaxy: "src/main".to_string(),
        };
        let json = serde_json::to_value(&star).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"x": 10, "y": -3, "n": "App.java", "c": "java", "g": "src/main"})
        );
    }
}
