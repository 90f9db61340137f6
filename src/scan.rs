//! Single-directory scanning.
//!
//! [`scan_directory`] reads one directory (non-recursively) and sorts its
//! children into the buckets the rest of the engine works with:
//!
//! ```text
//! trip/
//! ├── yapa/                 # metadata, never classified
//! │   └── links             # images imported from elsewhere
//! ├── dawn.jpg              # image (.jpg / .png)
//! ├── dawn.txt              # text note
//! ├── ride.gpx              # GPX track
//! ├── dawn.html             # existing page, matched or deleted later
//! ├── index.html            # existing index page
//! ├── index-2.html          # existing overflow index page
//! ├── rome/                 # subdirectory
//! ├── picfolio/             # ignored
//! └── dawn.jpg~             # scratch, deleted
//! ```
//!
//! Dot-files are skipped. Anything that is not one of the known kinds is
//! treated as leftover output and deleted.
//!
//! ## Links manifest
//!
//! `yapa/links` lists image paths relative to the directory, one per line.
//! Each entry becomes an image shown here but read from its own directory,
//! so a gallery can show pictures stored elsewhere under the root without
//! copying them.

use crate::config::ConfigError;
use crate::imaging::NailKind;
use crate::naming::{
    IGNORED_DIRS, INDEX_PAGE_PREFIX, LINKS_FILE, META_DIR, has_extension, is_image_name,
    parse_numbered_index,
};
use crate::types::{GpxItem, HtmlArtifact, ImageItem, NumberedIndex, TextNote};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot read directory {path}: {source}")]
    Unreadable { path: PathBuf, source: io::Error },
}

/// Scanner behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Report only: delete nothing and create no directories.
    pub dry_run: bool,
}

/// Everything found in one directory.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    /// Linked images first (manifest order), then local images by name.
    pub images: Vec<ImageItem>,
    pub texts: BTreeMap<String, TextNote>,
    pub gpx: Vec<GpxItem>,
    /// Existing pages, `index.html` included.
    pub html: Vec<HtmlArtifact>,
    pub numbered_indexes: Vec<NumberedIndex>,
    pub subdir_names: Vec<String>,
}

enum EntryKind {
    Image,
    Text,
    Gpx,
    Html,
    NumberedIndex(u32),
    /// Carries the index page prefix without being one of ours.
    IndexLike,
    Scratch,
}

fn classify_file(name: &str) -> EntryKind {
    if is_image_name(name) {
        EntryKind::Image
    } else if has_extension(name, "txt") {
        EntryKind::Text
    } else if has_extension(name, "gpx") {
        EntryKind::Gpx
    } else if has_extension(name, "html") {
        match parse_numbered_index(name) {
            Some(n) => EntryKind::NumberedIndex(n),
            None if name.starts_with(INDEX_PAGE_PREFIX) => EntryKind::IndexLike,
            None => EntryKind::Html,
        }
    } else {
        EntryKind::Scratch
    }
}

/// Scan one directory.
///
/// Errors reading the directory itself are returned; problems with single
/// entries are logged and the entry is skipped.
pub fn scan_directory(dir: &Path, options: &ScanOptions) -> Result<DirectoryScan, ScanError> {
    let mut scan = DirectoryScan::default();
    let mut seen_images: HashSet<String> = HashSet::new();

    for image in read_links(dir) {
        if seen_images.insert(image.name.clone()) {
            scan.images.push(image);
        } else {
            tracing::warn!(
                dir = %dir.display(),
                name = %image.name,
                "duplicate linked image, ignoring"
            );
        }
    }

    for (name, path) in collect_entries(dir)? {
        // Follows symlinks, so linked files classify like the real thing.
        let md = match fs::metadata(&path) {
            Ok(md) => md,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot stat entry, skipping");
                continue;
            }
        };

        if md.is_dir() {
            if IGNORED_DIRS.contains(&name.as_str()) {
                tracing::debug!(path = %path.display(), "ignoring directory");
            } else {
                scan.subdir_names.push(name);
            }
            continue;
        }
        if !md.is_file() {
            tracing::warn!(path = %path.display(), "not a regular file, skipping");
            continue;
        }
        let mtime = md.modified()?;

        match classify_file(&name) {
            EntryKind::Image => {
                if seen_images.insert(name.clone()) {
                    tracing::debug!(path = %path.display(), "classified as image");
                    scan.images
                        .push(ImageItem::new(name, dir.to_path_buf(), dir.to_path_buf(), mtime));
                } else {
                    tracing::warn!(
                        path = %path.display(),
                        "image also listed in links, using the linked one"
                    );
                }
            }
            EntryKind::Text => {
                scan.texts
                    .insert(name.clone(), TextNote { name, path, mtime });
            }
            EntryKind::Gpx => scan.gpx.push(GpxItem::new(name, path, mtime)),
            EntryKind::Html => scan.html.push(HtmlArtifact { name, path, mtime }),
            EntryKind::NumberedIndex(number) => scan.numbered_indexes.push(NumberedIndex {
                number,
                path,
                mtime,
            }),
            EntryKind::IndexLike => {
                tracing::warn!(
                    path = %path.display(),
                    "not a numbered index page, leaving it alone"
                );
            }
            EntryKind::Scratch => {
                if options.dry_run {
                    tracing::warn!(path = %path.display(), "unknown file, would be deleted");
                } else {
                    tracing::warn!(path = %path.display(), "deleting unknown file");
                    if let Err(e) = fs::remove_file(&path) {
                        tracing::warn!(path = %path.display(), error = %e, "cannot delete file");
                    }
                }
            }
        }
    }

    if !scan.images.is_empty() && !options.dry_run {
        ensure_metadata_dirs(dir)?;
    }

    Ok(scan)
}

/// Non-hidden children of `dir`, sorted by name.
fn collect_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, ScanError> {
    let read = fs::read_dir(dir).map_err(|source| ScanError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut entries: Vec<(String, PathBuf)> = read
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let Some(name) = e.file_name().to_str().map(str::to_string) else {
                tracing::warn!(
                    path = %e.path().display(),
                    "file name is not valid UTF-8, skipping"
                );
                return None;
            };
            (!name.starts_with('.')).then(|| (name, e.path()))
        })
        .collect();

    entries.sort();
    Ok(entries)
}

/// Read the links manifest of `dir`. A missing manifest is no links.
fn read_links(dir: &Path) -> Vec<ImageItem> {
    let manifest = dir.join(META_DIR).join(LINKS_FILE);
    let Ok(text) = fs::read_to_string(&manifest) else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let relative = Path::new(line);
        let target = dir.join(relative);
        let md = match fs::metadata(&target) {
            Ok(md) => md,
            Err(_) => {
                tracing::warn!(
                    manifest = %manifest.display(),
                    entry = line,
                    "file not found, ignoring"
                );
                continue;
            }
        };
        let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !md.is_file() || !is_image_name(name) {
            tracing::debug!(manifest = %manifest.display(), entry = line, "not an image, skipping");
            continue;
        }
        let Ok(mtime) = md.modified() else {
            continue;
        };

        let source_dir = match relative.parent() {
            Some(parent) => dir.join(parent),
            None => dir.to_path_buf(),
        };
        images.push(ImageItem::new(name, source_dir, dir.to_path_buf(), mtime));
    }
    images
}

fn create_dir_if_missing(path: &Path) -> io::Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Create the metadata directory and both nail directories of `dir`.
pub fn ensure_metadata_dirs(dir: &Path) -> io::Result<()> {
    let meta = dir.join(META_DIR);
    create_dir_if_missing(&meta)?;
    for kind in NailKind::ALL {
        create_dir_if_missing(&meta.join(kind.dir_name()))?;
    }
    Ok(())
}
