//! Shared test utilities for the gallery-sync test suite.
//!
//! Provides fixture builders, mtime control, and lookup helpers that work
//! with the in-memory tree (`DirectoryNode`, `ImageItem`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = gallery(&["a.jpg", "b.jpg", "trip/c.jpg"]);
//! set_mtime(&tmp.path().join("a.jpg"), 1_000);
//!
//! let root = build_tree(tmp.path(), &ScanOptions::default()).unwrap();
//! let trip = find_subdir(&root, "trip");
//! assert_eq!(find_image(trip, "c.jpg").name, "c.jpg");
//! ```

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::types::{DirectoryNode, ImageItem};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp gallery root holding the given files (paths relative to
/// the root, parent directories created as needed). File content is the
/// path itself.
pub fn gallery(files: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for file in files {
        write_file(tmp.path(), file, file);
    }
    tmp
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
}

/// A fixed point in time, `secs` seconds after the epoch.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Set the modification time of `path` to `secs` seconds after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(at(secs)).unwrap();
}

/// Set the modification time of every regular file under `dir`, recursively.
pub fn set_all_mtimes(dir: &Path, secs: u64) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            set_all_mtimes(&path, secs);
        } else {
            set_mtime(&path, secs);
        }
    }
}

pub fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

/// Sorted names of the entries directly inside `dir`.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// =========================================================================
// Tree lookups; they panic with the available names on a miss
// =========================================================================

/// Find a direct subdirectory by name. Panics if not found.
pub fn find_subdir<'a>(dir: &'a DirectoryNode, name: &str) -> &'a DirectoryNode {
    dir.subdirs
        .iter()
        .find(|d| d.name.as_deref() == Some(name))
        .unwrap_or_else(|| {
            let names: Vec<_> = dir.subdirs.iter().map(|d| d.name.clone()).collect();
            panic!("subdir '{name}' not found. Available: {names:?}")
        })
}

/// Find an image by file name. Panics if not found.
pub fn find_image<'a>(dir: &'a DirectoryNode, name: &str) -> &'a ImageItem {
    dir.images
        .iter()
        .find(|i| i.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = dir.images.iter().map(|i| i.name.as_str()).collect();
            panic!(
                "image '{name}' not found in {}. Available: {names:?}",
                dir.path.display()
            )
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

pub fn image_names(dir: &DirectoryNode) -> Vec<&str> {
    dir.images.iter().map(|i| i.name.as_str()).collect()
}

pub fn subdir_names(dir: &DirectoryNode) -> Vec<&str> {
    dir.subdirs.iter().filter_map(|d| d.name.as_deref()).collect()
}

pub fn gpx_names(dir: &DirectoryNode) -> Vec<&str> {
    dir.gpx.iter().map(|g| g.name.as_str()).collect()
}

/// Total number of directories in the tree, the root included.
pub fn count_directories(node: &DirectoryNode) -> usize {
    1 + node.subdirs.iter().map(count_directories).sum::<usize>()
}
