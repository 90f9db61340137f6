//! Gallery configuration.
//!
//! Configuration is hierarchical: stock defaults apply at the root, and every
//! directory inherits its parent's resolved values, overriding them field by
//! field from its own `yapa/config` file:
//!
//! ```text
//! photos/
//! ├── yapa/
//! │   ├── root                 # gallery-name=Holiday Photos (root only)
//! │   └── config               # overrides stock defaults
//! ├── 2009/
//! │   ├── yapa/config          # overrides root
//! │   └── Italy/
//! │       └── yapa/config      # overrides 2009
//! ```
//!
//! ## File Format
//!
//! One `key=value` pair per line. Keys are case-insensitive; key and value may
//! be separated by `=`, `:`, spaces or tabs. Blank lines are ignored.
//!
//! ```text
//! subdir-format=0        # 0: table, 1: bullet list
//! subdir-columns=5
//! image-columns=5
//! image-rows=3
//! thumbnail-size=128     # longest edge of grid thumbnails
//! midnail-size=640       # longest edge of the single-image view
//! sort-directory=1       # 0: none, 1: append new sorted, 2: always sorted
//! sort-images=1
//! ```
//!
//! Unknown keys and unparsable values are reported as warnings and ignored.

use crate::naming::{CONFIG_FILE, DEFAULT_GALLERY_NAME, META_DIR, ROOT_FILE};
use crate::reconcile::SortPolicy;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} exists but is not a regular file")]
    InvalidRoot(PathBuf),
}

/// Layout of the sub-gallery and track listings on index pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubdirFormat {
    Table,
    List,
}

impl SubdirFormat {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Table),
            1 => Some(Self::List),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Table => 0,
            Self::List => 1,
        }
    }
}

/// Resolved configuration for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryConfig {
    pub subdir_format: SubdirFormat,
    /// Entries per row in the sub-gallery table.
    pub subdir_columns: u32,
    /// Thumbnails per row on an index page.
    pub image_columns: u32,
    /// Thumbnail rows per index page.
    pub image_rows: u32,
    /// Longest edge of grid thumbnails, in pixels.
    pub thumbnail_size: u32,
    /// Longest edge of the single-image view, in pixels.
    pub midnail_size: u32,
    pub sort_directories: SortPolicy,
    /// Applies to images and GPX tracks.
    pub sort_images: SortPolicy,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            subdir_format: SubdirFormat::Table,
            subdir_columns: 5,
            image_columns: 5,
            image_rows: 3,
            thumbnail_size: 128,
            midnail_size: 640,
            sort_directories: SortPolicy::AppendNewSorted,
            sort_images: SortPolicy::AppendNewSorted,
        }
    }
}

impl GalleryConfig {
    /// Number of thumbnails shown on one index page.
    pub fn images_per_page(&self) -> usize {
        (self.image_rows as usize) * (self.image_columns as usize)
    }

    /// Apply one `key`/`value` pair. Returns a warning message when the pair
    /// is rejected; the current value is kept in that case.
    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        const KEYS: &[&str] = &[
            "subdir-format",
            "subdir-columns",
            "image-columns",
            "image-rows",
            "thumbnail-size",
            "midnail-size",
            "sort-directory",
            "sort-images",
        ];
        let key = key.to_ascii_lowercase();
        if !KEYS.contains(&key.as_str()) {
            return Err(format!("unknown option {}", key));
        }

        let number: u32 = value
            .parse()
            .map_err(|_| format!("invalid value '{}' for option {}", value, key))?;
        let positive = |n: u32| {
            if n == 0 {
                Err(format!("option {} must be greater than zero", key))
            } else {
                Ok(n)
            }
        };

        match key.as_str() {
            "subdir-format" => {
                self.subdir_format = SubdirFormat::from_code(number)
                    .ok_or_else(|| format!("subdir-format must be 0 or 1, got {}", number))?;
            }
            "subdir-columns" => self.subdir_columns = positive(number)?,
            "image-columns" => self.image_columns = positive(number)?,
            "image-rows" => self.image_rows = positive(number)?,
            "thumbnail-size" => self.thumbnail_size = positive(number)?,
            "midnail-size" => self.midnail_size = positive(number)?,
            "sort-directory" => {
                self.sort_directories = SortPolicy::from_code(number)
                    .ok_or_else(|| format!("sort-directory must be 0, 1 or 2, got {}", number))?;
            }
            "sort-images" => {
                self.sort_images = SortPolicy::from_code(number)
                    .ok_or_else(|| format!("sort-images must be 0, 1 or 2, got {}", number))?;
            }
            _ => return Err(format!("unknown option {}", key)),
        }
        Ok(())
    }

    /// Overlay the pairs found in `text` on top of `self`.
    pub fn merge_text(mut self, text: &str, origin: &Path) -> Self {
        for (key, value) in parse_pairs(text) {
            if let Err(message) = self.apply(key, value) {
                tracing::warn!(file = %origin.display(), "{}", message);
            }
        }
        self
    }
}

/// Split configuration text into `(key, value)` pairs.
///
/// The key ends at the first separator (`=`, `:`, space or tab); the value is
/// the rest of the line after any run of separators. Lines without a value
/// are dropped.
pub fn parse_pairs(text: &str) -> Vec<(&str, &str)> {
    let is_sep = |c: char| matches!(c, '=' | ':' | ' ' | '\t');
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let end = line.find(is_sep)?;
            let (key, rest) = line.split_at(end);
            let value = rest.trim_start_matches(is_sep);
            (!value.is_empty()).then_some((key, value))
        })
        .collect()
}

fn meta_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(META_DIR).join(name)
}

/// Resolve the configuration of `dir`, inheriting from `parent`.
///
/// A missing or unreadable config file means "no overrides".
pub fn load_config(dir: &Path, parent: &GalleryConfig) -> GalleryConfig {
    let path = meta_file(dir, CONFIG_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => parent.clone().merge_text(&text, &path),
        Err(_) => parent.clone(),
    }
}

/// Read the gallery name from the root marker file, if one is set.
///
/// A missing marker means no name; a marker that is not a regular file is
/// an error.
pub fn load_gallery_name(root: &Path) -> Result<Option<String>, ConfigError> {
    let path = meta_file(root, ROOT_FILE);
    match fs::metadata(&path) {
        Ok(md) if !md.is_file() => return Err(ConfigError::InvalidRoot(path)),
        Ok(_) => {}
        Err(_) => return Ok(None),
    }
    let Ok(text) = fs::read_to_string(&path) else {
        return Ok(None);
    };
    let mut name = None;
    for (key, value) in parse_pairs(&text) {
        if key.eq_ignore_ascii_case("gallery-name") {
            name = Some(value.to_string());
        } else {
            tracing::warn!(file = %path.display(), "unknown option {}", key);
        }
    }
    Ok(name)
}

/// Walk up from `start` to the first directory carrying a `yapa/root` file.
///
/// Returns `Ok(None)` when no ancestor is a gallery root.
pub fn find_root_dir(start: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let start = start.canonicalize()?;
    for dir in start.ancestors() {
        let marker = meta_file(dir, ROOT_FILE);
        match fs::metadata(&marker) {
            Ok(md) if md.is_file() => return Ok(Some(dir.to_path_buf())),
            Ok(_) => return Err(ConfigError::InvalidRoot(marker)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => continue,
            Err(e) => return Err(ConfigError::Io(e)),
        }
    }
    Ok(None)
}

/// Turn `dir` into a gallery root: write the root marker and a config file
/// listing every option with its default value.
pub fn create_root_config(dir: &Path) -> Result<(), ConfigError> {
    let meta = dir.join(META_DIR);
    match fs::create_dir(&meta) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.into()),
    }
    fs::write(
        meta.join(ROOT_FILE),
        format!("gallery-name={}\n", DEFAULT_GALLERY_NAME),
    )?;
    fs::write(meta.join(CONFIG_FILE), stock_config_text())?;
    Ok(())
}

/// Config file content listing every option at its default value.
pub fn stock_config_text() -> String {
    let c = GalleryConfig::default();
    format!(
        "subdir-format={}\n\
         subdir-columns={}\n\
         image-columns={}\n\
         image-rows={}\n\
         thumbnail-size={}\n\
         midnail-size={}\n\
         sort-directory={}\n\
         sort-images={}\n",
        c.subdir_format.code(),
        c.subdir_columns,
        c.image_columns,
        c.image_rows,
        c.thumbnail_size,
        c.midnail_size,
        c.sort_directories.code(),
        c.sort_images.code(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, text: &str) {
        fs::create_dir_all(dir.join(META_DIR)).unwrap();
        fs::write(dir.join(META_DIR).join(CONFIG_FILE), text).unwrap();
    }

    // =========================================================================
    // Defaults and parsing
    // =========================================================================

    #[test]
    fn default_config_values() {
        let c = GalleryConfig::default();
        assert_eq!(c.subdir_format, SubdirFormat::Table);
        assert_eq!(c.subdir_columns, 5);
        assert_eq!(c.image_columns, 5);
        assert_eq!(c.image_rows, 3);
        assert_eq!(c.thumbnail_size, 128);
        assert_eq!(c.midnail_size, 640);
        assert_eq!(c.sort_directories, SortPolicy::AppendNewSorted);
        assert_eq!(c.sort_images, SortPolicy::AppendNewSorted);
        assert_eq!(c.images_per_page(), 15);
    }

    #[test]
    fn parse_pairs_accepts_all_separators() {
        let pairs = parse_pairs("a=1\nb: 2\n  c\t3  \nd = 4\n\n");
        assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
    }

    #[test]
    fn parse_pairs_drops_lines_without_value() {
        assert!(parse_pairs("lonely\nempty=\n").is_empty());
    }

    #[test]
    fn parse_pairs_keeps_spaces_inside_value() {
        assert_eq!(
            parse_pairs("gallery-name=Holiday Photos"),
            vec![("gallery-name", "Holiday Photos")]
        );
    }

    #[test]
    fn merge_overrides_only_given_fields() {
        let c =
            GalleryConfig::default().merge_text("image-rows=4\nSORT-IMAGES=2\n", Path::new("x"));
        assert_eq!(c.image_rows, 4);
        assert_eq!(c.sort_images, SortPolicy::AlwaysSorted);
        assert_eq!(c.image_columns, 5);
    }

    #[test]
    fn merge_ignores_unknown_and_invalid() {
        let c = GalleryConfig::default().merge_text(
            "colour=blue\nimage-rows=abc\nimage-columns=0\nsort-images=7\n",
            Path::new("x"),
        );
        assert_eq!(c, GalleryConfig::default());
    }

    #[test]
    fn subdir_format_list() {
        let c = GalleryConfig::default().merge_text("subdir-format=1", Path::new("x"));
        assert_eq!(c.subdir_format, SubdirFormat::List);
    }

    // =========================================================================
    // Inheritance
    // =========================================================================

    #[test]
    fn load_config_without_file_inherits_parent() {
        let tmp = TempDir::new().unwrap();
        let parent = GalleryConfig {
            image_rows: 7,
            ..GalleryConfig::default()
        };
        assert_eq!(load_config(tmp.path(), &parent), parent);
    }

    #[test]
    fn load_config_overrides_parent_field_by_field() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "thumbnail-size=200\n");
        let parent = GalleryConfig {
            image_rows: 7,
            ..GalleryConfig::default()
        };
        let c = load_config(tmp.path(), &parent);
        assert_eq!(c.thumbnail_size, 200);
        assert_eq!(c.image_rows, 7);
    }

    // =========================================================================
    // Root handling
    // =========================================================================

    #[test]
    fn find_root_dir_none_without_marker() {
        let tmp = TempDir::new().unwrap();
        // The temp dir's ancestors are not galleries either.
        assert_eq!(find_root_dir(tmp.path()).unwrap(), None);
    }

    #[test]
    fn find_root_dir_walks_up() {
        let tmp = TempDir::new().unwrap();
        create_root_config(tmp.path()).unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let root = find_root_dir(&nested).unwrap().unwrap();
        assert_eq!(root, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn find_root_dir_rejects_marker_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(META_DIR).join(ROOT_FILE)).unwrap();
        assert!(matches!(
            find_root_dir(tmp.path()),
            Err(ConfigError::InvalidRoot(_))
        ));
    }

    #[test]
    fn create_root_config_writes_marker_and_defaults() {
        let tmp = TempDir::new().unwrap();
        create_root_config(tmp.path()).unwrap();

        assert_eq!(load_gallery_name(tmp.path()).unwrap().as_deref(), Some("Photo Gallery"));
        let c = load_config(tmp.path(), &GalleryConfig::default());
        assert_eq!(c, GalleryConfig::default());
    }

    #[test]
    fn create_root_config_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        create_root_config(tmp.path()).unwrap();
        create_root_config(tmp.path()).unwrap();
        assert!(tmp.path().join(META_DIR).join(ROOT_FILE).is_file());
    }

    #[test]
    fn gallery_name_reads_custom_value() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(META_DIR)).unwrap();
        fs::write(
            tmp.path().join(META_DIR).join(ROOT_FILE),
            "Gallery-Name: Holiday Photos\nother=1\n",
        )
        .unwrap();
        assert_eq!(load_gallery_name(tmp.path()).unwrap().as_deref(), Some("Holiday Photos"));
    }

    #[test]
    fn stock_config_text_round_trips_to_defaults() {
        let c = GalleryConfig::default().merge_text(&stock_config_text(), Path::new("x"));
        assert_eq!(c, GalleryConfig::default());
    }
}
