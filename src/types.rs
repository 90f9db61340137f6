//! In-memory gallery tree shared by the scanner, the staleness pass and the
//! driver.
//!
//! A [`DirectoryNode`] owns its items and its child directories outright;
//! there are no back-pointers. What a child needs from its parent (the
//! parent's order-file mtime and resolved config) is copied in when the tree
//! is assembled or reconciled.
//!
//! All types serialize to JSON for the `scan` command.

use crate::config::GalleryConfig;
use crate::metadata::ImageMetadata;
use crate::naming::META_DIR;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

/// An entry of an ordered collection: unique name plus an optional
/// user-curated label.
pub trait Named {
    fn name(&self) -> &str;
    fn label(&self) -> Option<&str>;
    fn set_label(&mut self, label: Option<String>);
}

/// A source image, either local or imported through the links manifest.
#[derive(Debug, Clone, Serialize)]
pub struct ImageItem {
    /// File name, unique within the containing directory.
    pub name: String,
    /// Directory the source file physically lives in.
    pub source_dir: PathBuf,
    /// Directory the page and nails are written to.
    pub output_dir: PathBuf,
    pub label: Option<String>,
    pub mtime: SystemTime,
    /// Page file name, assigned during reconciliation.
    pub page_name: String,
    /// Mtime of the existing page, if one was matched on disk.
    pub html_mtime: Option<SystemTime>,
    /// Mtime of the item's description note, if any.
    pub description_mtime: Option<SystemTime>,
    /// Filled lazily, only when the page is regenerated.
    pub metadata: Option<ImageMetadata>,
}

impl ImageItem {
    pub fn new(
        name: impl Into<String>,
        source_dir: PathBuf,
        output_dir: PathBuf,
        mtime: SystemTime,
    ) -> Self {
        Self {
            name: name.into(),
            source_dir,
            output_dir,
            label: None,
            mtime,
            page_name: String::new(),
            html_mtime: None,
            description_mtime: None,
            metadata: None,
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.name)
    }

    /// True when the source file lives outside the output directory.
    pub fn is_linked(&self) -> bool {
        self.source_dir != self.output_dir
    }
}

/// A GPX track file. Same lifecycle as an image, but its only artifact is its
/// own page.
#[derive(Debug, Clone, Serialize)]
pub struct GpxItem {
    pub name: String,
    pub path: PathBuf,
    pub label: Option<String>,
    pub mtime: SystemTime,
    pub page_name: String,
    pub html_mtime: Option<SystemTime>,
    pub description_mtime: Option<SystemTime>,
}

impl GpxItem {
    pub fn new(name: impl Into<String>, path: PathBuf, mtime: SystemTime) -> Self {
        Self {
            name: name.into(),
            path,
            label: None,
            mtime,
            page_name: String::new(),
            html_mtime: None,
            description_mtime: None,
        }
    }
}

/// A plain-text description, looked up by file name.
#[derive(Debug, Clone, Serialize)]
pub struct TextNote {
    pub name: String,
    pub path: PathBuf,
    pub mtime: SystemTime,
}

/// A generated page found on disk before this run touched it.
#[derive(Debug, Clone, Serialize)]
pub struct HtmlArtifact {
    pub name: String,
    pub path: PathBuf,
    pub mtime: SystemTime,
}

/// An overflow index page (`index-<n>.html`) found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct NumberedIndex {
    pub number: u32,
    pub path: PathBuf,
    pub mtime: SystemTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryNode {
    pub path: PathBuf,
    /// `None` only for the tree root.
    pub name: Option<String>,
    pub label: Option<String>,
    pub config: GalleryConfig,
    pub images: Vec<ImageItem>,
    pub subdirs: Vec<DirectoryNode>,
    pub gpx: Vec<GpxItem>,
    /// Keyed by file name.
    pub texts: BTreeMap<String, TextNote>,
    /// Existing pages not yet claimed by a live item.
    pub html: Vec<HtmlArtifact>,
    pub numbered_indexes: Vec<NumberedIndex>,
    force_regenerate: bool,
    pub index_mtime: Option<SystemTime>,
    pub description_mtime: Option<SystemTime>,
    /// Newest mtime among this directory's order files.
    pub order_file_mtime: Option<SystemTime>,
    /// The parent's `order_file_mtime`, copied in during reconciliation.
    pub parent_order_file_mtime: Option<SystemTime>,
}

impl DirectoryNode {
    pub fn new(path: PathBuf, name: Option<String>, config: GalleryConfig) -> Self {
        Self {
            path,
            name,
            label: None,
            config,
            images: Vec::new(),
            subdirs: Vec::new(),
            gpx: Vec::new(),
            texts: BTreeMap::new(),
            html: Vec::new(),
            numbered_indexes: Vec::new(),
            force_regenerate: false,
            index_mtime: None,
            description_mtime: None,
            order_file_mtime: None,
            parent_order_file_mtime: None,
        }
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.path.join(META_DIR)
    }

    pub fn meta_file(&self, name: &str) -> PathBuf {
        self.meta_dir().join(name)
    }

    /// Set the rebuild flag. The flag is never cleared during a run.
    pub fn mark_stale(&mut self) {
        self.force_regenerate = true;
    }

    pub fn force_regenerate(&self) -> bool {
        self.force_regenerate
    }

    /// A directory with nothing to show is not part of the gallery.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.subdirs.is_empty()
    }

    /// Record `mtime` as an order-file mtime, keeping the newest.
    pub fn note_order_file_mtime(&mut self, mtime: Option<SystemTime>) {
        if let Some(m) = mtime {
            self.order_file_mtime = Some(self.order_file_mtime.map_or(m, |cur| cur.max(m)));
        }
    }
}

impl Named for ImageItem {
    fn name(&self) -> &str {
        &self.name
    }
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }
}

impl Named for GpxItem {
    fn name(&self) -> &str {
        &self.name
    }
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }
}

impl Named for DirectoryNode {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
    fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }
}
