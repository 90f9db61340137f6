//! Artifact driver.
//!
//! Walks the reconciled tree top-down and brings every generated artifact up
//! to date: nails, item pages, track pages, and the paginated index pages.
//! Obsolete artifacts (nails of removed images, stray files in nail
//! directories, overflow index pages past the last page) are deleted.
//!
//! Work is strictly sequential. Progress is reported as [`SyncEvent`]s over
//! an optional channel so the CLI can print while the sync runs; diagnostics
//! go through `tracing`.
//!
//! Failure policy: an image that cannot be decoded is skipped with a warning
//! and the run goes on. Any other backend failure, and any failure to write
//! a page, aborts the run.

use crate::config::ConfigError;
use crate::imaging::{
    BackendError, ImageBackend, NailKind, NailOutcome, Quality, create_nail, nail_dir, nail_path,
};
use crate::metadata::{ImageMetadata, read_note};
use crate::naming::{self, DIRECTORY_NOTE_STEM};
use crate::reconcile::ReconcileError;
use crate::render;
use crate::scan::{ScanError, ScanOptions};
use crate::staleness::{
    IndexInputs, PageInputs, RunOptions, index_is_stale, nail_is_stale, page_is_stale,
    reconcile_directory,
};
use crate::tree::{build_tree, resolve_root};
use crate::types::{DirectoryNode, ImageItem};
use maud::Markup;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Order file error: {0}")]
    Reconcile(#[from] ReconcileError),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot write {path}: {source}")]
    OutputFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Progress events, in the order the work happens.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    RootCreated { path: PathBuf },
    EnteringDirectory { path: PathBuf },
    ObsoleteHtmlDeleted { path: PathBuf },
    NailCreated {
        kind: NailKind,
        name: String,
        outcome: NailOutcome,
    },
    ObsoleteNailDeleted { kind: NailKind, path: PathBuf },
    StrayNailFileDeleted { kind: NailKind, path: PathBuf },
    PageWritten { item: String, path: PathBuf },
    IndexWritten { path: PathBuf },
    OrphanIndexDeleted { path: PathBuf },
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub directories: usize,
    pub nails_created: usize,
    pub pages_written: usize,
    pub index_pages_written: usize,
    pub files_deleted: usize,
}

impl SyncSummary {
    /// True when the run changed nothing on disk.
    pub fn is_noop(&self) -> bool {
        self.nails_created == 0
            && self.pages_written == 0
            && self.index_pages_written == 0
            && self.files_deleted == 0
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} directories: {} nails created, {} pages and {} index pages written, {} files deleted",
            self.directories,
            self.nails_created,
            self.pages_written,
            self.index_pages_written,
            self.files_deleted
        )
    }
}

/// Number of index pages for `images` images, `per_page` to a page. A
/// directory always has at least its first page.
pub fn page_count(images: usize, per_page: usize) -> usize {
    images.div_ceil(per_page.max(1)).max(1)
}

/// 1-based index page showing the image at 0-based `position`.
pub fn page_of(position: usize, per_page: usize) -> usize {
    1 + position / per_page.max(1)
}

/// Sync the gallery containing `start`.
///
/// The gallery root is the nearest ancestor carrying a root marker; when
/// there is none, `start` becomes the root. The whole tree under the root is
/// scanned and brought up to date.
pub fn sync_gallery<B: ImageBackend>(
    start: &Path,
    backend: &B,
    options: RunOptions,
    events: Option<Sender<SyncEvent>>,
) -> Result<SyncSummary, SyncError> {
    let root = resolve_root(start)?;
    if root.created {
        if let Some(tx) = &events {
            let _ = tx.send(SyncEvent::RootCreated {
                path: root.path.clone(),
            });
        }
    }
    tracing::debug!(root = %root.path.display(), "gallery root");
    let mut tree = build_tree(&root.path, &ScanOptions::default())?;
    sync_tree(&mut tree, backend, options, events)
}

/// Bring the whole tree under `root` up to date.
///
/// `root` must come from [`build_tree`](crate::tree::build_tree) on the same
/// filesystem state; the driver trusts the scanned mtimes.
pub fn sync_tree<B: ImageBackend>(
    root: &mut DirectoryNode,
    backend: &B,
    options: RunOptions,
    events: Option<Sender<SyncEvent>>,
) -> Result<SyncSummary, SyncError> {
    let mut driver = Driver {
        backend,
        options,
        quality: Quality::default(),
        events,
        summary: SyncSummary::default(),
    };
    let mut trail = vec![naming::directory_label(
        root.label.as_deref(),
        root.name.as_deref(),
    )];
    driver.sync_directory(root, &mut trail)?;
    Ok(driver.summary)
}

struct Driver<'a, B> {
    backend: &'a B,
    options: RunOptions,
    quality: Quality,
    events: Option<Sender<SyncEvent>>,
    summary: SyncSummary,
}

impl<B: ImageBackend> Driver<'_, B> {
    fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }

    fn sync_directory(
        &mut self,
        dir: &mut DirectoryNode,
        trail: &mut Vec<String>,
    ) -> Result<(), SyncError> {
        self.summary.directories += 1;
        self.emit(SyncEvent::EnteringDirectory {
            path: dir.path.clone(),
        });

        let report = reconcile_directory(dir)?;
        for path in report.deleted_pages {
            self.summary.files_deleted += 1;
            self.emit(SyncEvent::ObsoleteHtmlDeleted { path });
        }

        for kind in NailKind::ALL {
            self.update_nails(dir, kind)?;
        }
        self.write_image_pages(dir, trail)?;
        self.write_track_pages(dir, trail)?;
        self.write_index_pages(dir, trail)?;

        for child in dir.subdirs.iter_mut() {
            trail.push(naming::directory_label(
                child.label.as_deref(),
                child.name.as_deref(),
            ));
            let result = self.sync_directory(child, trail);
            trail.pop();
            result?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Nails
    // ------------------------------------------------------------------------

    fn update_nails(&mut self, dir: &DirectoryNode, kind: NailKind) -> Result<(), SyncError> {
        let dir_path = nail_dir(&dir.path, kind);
        if dir.images.is_empty() && !dir_path.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&dir_path)?;

        let wanted: HashSet<&str> = dir.images.iter().map(|i| i.name.as_str()).collect();
        let mut existing: HashMap<String, SystemTime> = HashMap::new();

        let mut entries: Vec<_> = fs::read_dir(&dir_path)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let meta = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "cannot stat nail, ignoring"
                    );
                    continue;
                }
            };
            if meta.is_dir() {
                tracing::warn!(path = %path.display(), "unexpected directory in nail directory");
                continue;
            }
            if !naming::is_image_name(&name) {
                if self.remove(&path) {
                    self.emit(SyncEvent::StrayNailFileDeleted { kind, path });
                }
            } else if !wanted.contains(name.as_str()) {
                if self.remove(&path) {
                    self.emit(SyncEvent::ObsoleteNailDeleted { kind, path });
                }
            } else {
                existing.insert(name, meta.modified()?);
            }
        }

        let bound = match kind {
            NailKind::Thumbnail => dir.config.thumbnail_size,
            NailKind::Midnail => dir.config.midnail_size,
        };
        for image in &dir.images {
            let current = existing.get(&image.name).copied();
            if !nail_is_stale(image.mtime, current, &self.options) {
                continue;
            }
            let output = nail_path(&dir.path, kind, &image.name);
            match create_nail(self.backend, &image.source_path(), &output, bound, self.quality) {
                Ok(outcome) => {
                    self.summary.nails_created += 1;
                    self.emit(SyncEvent::NailCreated {
                        kind,
                        name: image.name.clone(),
                        outcome,
                    });
                }
                Err(BackendError::Unreadable(reason)) => {
                    tracing::warn!(
                        image = %image.source_path().display(),
                        reason = %reason,
                        "cannot read image, skipping {}",
                        kind.label()
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Delete a generated file, counting it. Failures are logged, not fatal.
    fn remove(&mut self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                self.summary.files_deleted += 1;
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot delete file");
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------------

    fn read_metadata(&self, image: &ImageItem) -> ImageMetadata {
        match self.backend.read_metadata(&image.source_path()) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(
                    image = %image.source_path().display(),
                    error = %e,
                    "cannot read EXIF data"
                );
                ImageMetadata::default()
            }
        }
    }

    fn write_image_pages(
        &mut self,
        dir: &mut DirectoryNode,
        trail: &[String],
    ) -> Result<(), SyncError> {
        let empty = ImageMetadata::default();
        for index in 0..dir.images.len() {
            let image = &dir.images[index];
            let inputs = PageInputs {
                source_mtime: image.mtime,
                description_mtime: image.description_mtime,
                html_mtime: image.html_mtime,
                force_regenerate: dir.force_regenerate(),
            };
            if !page_is_stale(&inputs, &self.options) {
                continue;
            }

            if image.metadata.is_none() {
                let metadata = self.read_metadata(image);
                dir.images[index].metadata = Some(metadata);
            }
            let image = &dir.images[index];
            let description = item_description(dir, &image.name);
            let markup = render::render_image_page(
                dir,
                trail,
                index,
                description.as_deref(),
                image.metadata.as_ref().unwrap_or(&empty),
            );
            let path = dir.path.join(&image.page_name);
            write_page(&path, markup)?;
            self.summary.pages_written += 1;
            self.emit(SyncEvent::PageWritten {
                item: image.name.clone(),
                path,
            });
        }
        Ok(())
    }

    fn write_track_pages(
        &mut self,
        dir: &DirectoryNode,
        trail: &[String],
    ) -> Result<(), SyncError> {
        for (index, track) in dir.gpx.iter().enumerate() {
            let inputs = PageInputs {
                source_mtime: track.mtime,
                description_mtime: track.description_mtime,
                html_mtime: track.html_mtime,
                force_regenerate: dir.force_regenerate(),
            };
            if !page_is_stale(&inputs, &self.options) {
                continue;
            }
            let description = item_description(dir, &track.name);
            let markup = render::render_track_page(dir, trail, index, description.as_deref());
            let path = dir.path.join(&track.page_name);
            write_page(&path, markup)?;
            self.summary.pages_written += 1;
            self.emit(SyncEvent::PageWritten {
                item: track.name.clone(),
                path,
            });
        }
        Ok(())
    }

    fn write_index_pages(
        &mut self,
        dir: &DirectoryNode,
        trail: &[String],
    ) -> Result<(), SyncError> {
        let pages = page_count(dir.images.len(), dir.config.images_per_page());

        if index_is_stale(&IndexInputs::for_directory(dir, pages), &self.options) {
            let description = dir
                .texts
                .get(&format!("{}.txt", DIRECTORY_NOTE_STEM))
                .and_then(|note| read_note(&note.path));
            for page in 1..=pages {
                let markup =
                    render::render_index_page(dir, trail, page, pages, description.as_deref());
                let path = dir.path.join(naming::index_file_name(page));
                write_page(&path, markup)?;
                self.summary.index_pages_written += 1;
                self.emit(SyncEvent::IndexWritten { path });
            }
        }

        for orphan in &dir.numbered_indexes {
            let number = orphan.number as usize;
            if (2..=pages).contains(&number) {
                continue;
            }
            if self.remove(&orphan.path) {
                self.emit(SyncEvent::OrphanIndexDeleted {
                    path: orphan.path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Text of the first existing note for the item `name`.
fn item_description(dir: &DirectoryNode, name: &str) -> Option<String> {
    naming::note_candidates(name)
        .iter()
        .find_map(|candidate| dir.texts.get(candidate))
        .and_then(|note| read_note(&note.path))
}

fn write_page(path: &Path, markup: Markup) -> Result<(), SyncError> {
    fs::write(path, markup.into_string()).map_err(|source| SyncError::OutputFailed {
        path: path.to_path_buf(),
        source,
    })
}
