//! Tree assembly.
//!
//! [`build_tree`] scans the root and every reachable subdirectory, top-down,
//! and returns the owned [`DirectoryNode`] tree. Each node gets its resolved
//! configuration (parent's config overlaid with its own `yapa/config`).
//!
//! Directories that end up with neither images nor non-empty subdirectories
//! are pruned: they are not part of the gallery. The root is always kept.

use crate::config::{
    ConfigError, GalleryConfig, create_root_config, find_root_dir, load_config, load_gallery_name,
};
use crate::scan::{DirectoryScan, ScanError, ScanOptions, scan_directory};
use crate::types::DirectoryNode;
use std::path::{Path, PathBuf};

/// The directory a run starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryRoot {
    pub path: PathBuf,
    /// The root marker was written by this call.
    pub created: bool,
}

/// Find the gallery root above `start`, or make `start` one.
pub fn resolve_root(start: &Path) -> Result<GalleryRoot, ConfigError> {
    if let Some(path) = find_root_dir(start)? {
        return Ok(GalleryRoot {
            path,
            created: false,
        });
    }
    let path = start.canonicalize()?;
    tracing::info!(path = %path.display(), "no gallery root found, creating one");
    create_root_config(&path)?;
    Ok(GalleryRoot {
        path,
        created: true,
    })
}

/// Build the in-memory tree rooted at `root`.
///
/// An unreadable root is an error; an unreadable subdirectory is logged and
/// left out.
pub fn build_tree(root: &Path, options: &ScanOptions) -> Result<DirectoryNode, ScanError> {
    let config = load_config(root, &GalleryConfig::default());
    let mut node = build_node(root.to_path_buf(), None, config, options)?;
    node.label = load_gallery_name(root)?;
    Ok(node)
}

fn build_node(
    path: PathBuf,
    name: Option<String>,
    config: GalleryConfig,
    options: &ScanOptions,
) -> Result<DirectoryNode, ScanError> {
    tracing::debug!(path = %path.display(), "scanning");
    let DirectoryScan {
        images,
        texts,
        gpx,
        html,
        numbered_indexes,
        subdir_names,
    } = scan_directory(&path, options)?;

    let mut node = DirectoryNode::new(path, name, config);
    node.images = images;
    node.texts = texts;
    node.gpx = gpx;
    node.html = html;
    node.numbered_indexes = numbered_indexes;

    for sub in subdir_names {
        let sub_path = node.path.join(&sub);
        let sub_config = load_config(&sub_path, &node.config);
        match build_node(sub_path, Some(sub), sub_config, options) {
            Ok(child) if child.is_empty() => {
                tracing::debug!(path = %child.path.display(), "no images, skipping directory");
            }
            Ok(child) => node.subdirs.push(child),
            Err(ScanError::Unreadable { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "cannot read directory, skipping"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::META_DIR;
    use crate::reconcile::SortPolicy;
    use crate::test_helpers::*;
    use std::fs;

    #[test]
    fn builds_nested_tree() {
        let tmp = gallery(&["a.jpg", "2009/rome/b.jpg", "2009/paris/c.png", "notes.txt"]);
        let root = build_tree(tmp.path(), &ScanOptions::default()).unwrap();

        assert_eq!(root.name, None);
        assert_eq!(image_names(&root), vec!["a.jpg"]);
        assert!(root.texts.contains_key("notes.txt"));

        let y2009 = find_subdir(&root, "2009");
        assert!(y2009.images.is_empty());
        assert_eq!(subdir_names(y2009), vec!["paris", "rome"]);
        assert_eq!(image_names(find_subdir(y2009, "rome")), vec!["b.jpg"]);
        assert_eq!(count_directories(&root), 4);
    }

    #[test]
    fn empty_directories_are_pruned() {
        let tmp = gallery(&["a.jpg", "empty/readme.txt", "deep/deeper/notes.txt"]);
        fs::create_dir_all(tmp.path().join("bare")).unwrap();

        let root = build_tree(tmp.path(), &ScanOptions::default()).unwrap();
        assert!(root.subdirs.is_empty());
    }

    #[test]
    fn empty_root_is_kept() {
        let tmp = gallery(&[]);
        let root = build_tree(tmp.path(), &ScanOptions::default()).unwrap();
        assert!(root.is_empty());
    }

    #[test]
    fn config_is_inherited_and_overridden() {
        let tmp = gallery(&["a.jpg", "trip/b.jpg", "trip/day1/c.jpg"]);
        write_file(tmp.path(), "yapa/config", "image-rows=4\nsort-images=2\n");
        write_file(tmp.path(), "trip/yapa/config", "image-columns=2\n");

        let root = build_tree(tmp.path(), &ScanOptions::default()).unwrap();
        let trip = find_subdir(&root, "trip");
        let day1 = find_subdir(trip, "day1");

        assert_eq!(root.config.image_rows, 4);
        assert_eq!(root.config.image_columns, 5);
        assert_eq!(trip.config.image_rows, 4);
        assert_eq!(trip.config.image_columns, 2);
        assert_eq!(day1.config.image_columns, 2);
        assert_eq!(day1.config.sort_images, SortPolicy::AlwaysSorted);
    }

    #[test]
    fn root_label_from_gallery_name() {
        let tmp = gallery(&["a.jpg"]);
        write_file(tmp.path(), "yapa/root", "gallery-name=Family Album\n");

        let root = build_tree(tmp.path(), &ScanOptions::default()).unwrap();
        assert_eq!(root.label.as_deref(), Some("Family Album"));
    }

    #[test]
    fn root_marker_directory_is_an_error() {
        let tmp = gallery(&["a.jpg"]);
        fs::create_dir_all(tmp.path().join(META_DIR).join("root")).unwrap();

        let result = build_tree(tmp.path(), &ScanOptions::default());
        assert!(matches!(result, Err(ScanError::Config(_))));
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = gallery(&[]);
        let result = build_tree(&tmp.path().join("nope"), &ScanOptions::default());
        assert!(matches!(result, Err(ScanError::Unreadable { .. })));
    }

    #[test]
    fn resolve_root_finds_marker_above() {
        let tmp = gallery(&["trip/day1/a.jpg"]);
        write_file(tmp.path(), "yapa/root", "gallery-name=Album\n");

        let root = resolve_root(&tmp.path().join("trip/day1")).unwrap();
        assert_eq!(root.path, tmp.path().canonicalize().unwrap());
        assert!(!root.created);
    }

    #[test]
    fn resolve_root_creates_marker_when_missing() {
        let tmp = gallery(&["a.jpg"]);

        let root = resolve_root(tmp.path()).unwrap();
        assert!(root.created);
        assert!(tmp.path().join("yapa/root").is_file());
        assert!(tmp.path().join("yapa/config").is_file());

        let again = resolve_root(tmp.path()).unwrap();
        assert!(!again.created);
        assert_eq!(again.path, root.path);
    }

    #[test]
    fn metadata_dirs_exist_after_build() {
        let tmp = gallery(&["trip/a.jpg"]);
        build_tree(tmp.path(), &ScanOptions::default()).unwrap();
        assert!(tmp.path().join("trip/yapa/thumbnails").is_dir());
        // The root has no images of its own.
        assert!(!tmp.path().join("yapa").exists());
    }
}
