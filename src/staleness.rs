//! Staleness decisions.
//!
//! Every generated artifact is checked against what it was derived from,
//! using modification times only. There is no other persisted state: the
//! order files and the artifacts' own mtimes are the checkpoint of the last
//! run.
//!
//! | Artifact | Rebuilt when |
//! |----------|--------------|
//! | nail | missing, or source newer than nail |
//! | item page | missing, source or description newer than page, directory forced |
//! | index pages | a page missing, directory forced, description or any relevant order file newer than the oldest page |
//!
//! "Newer" is strict: equal mtimes count as fresh, so a second run over an
//! unchanged tree writes nothing even on filesystems with coarse timestamps.
//!
//! A directory is *forced* when [`reconcile_directory`] sees a structural
//! change: an item added or removed, a re-sort, an orphaned page deleted, or
//! an order file edited after the pages were written. The flag only ever
//! goes from unset to set during a run.

use crate::naming::{
    self, DIRECTORIES_ORDER_FILE, DIRECTORY_NOTE_STEM, GPX_ORDER_FILE, IMAGES_ORDER_FILE,
};
use crate::reconcile::{ReconcileError, sync_order_file};
use crate::types::{DirectoryNode, HtmlArtifact, TextNote};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

/// Run-wide overrides, supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Rewrite every page and index page.
    pub force_html: bool,
    /// Recreate every nail.
    pub force_nails: bool,
}

/// True when `dependency` exists and is strictly newer than `artifact`.
pub fn is_newer(dependency: Option<SystemTime>, artifact: SystemTime) -> bool {
    dependency.is_some_and(|d| d > artifact)
}

pub fn nail_is_stale(source: SystemTime, nail: Option<SystemTime>, options: &RunOptions) -> bool {
    options.force_nails || nail.is_none_or(|n| source > n)
}

/// Inputs deciding whether an item page must be rewritten.
#[derive(Debug, Clone, Copy)]
pub struct PageInputs {
    pub source_mtime: SystemTime,
    pub description_mtime: Option<SystemTime>,
    pub html_mtime: Option<SystemTime>,
    pub force_regenerate: bool,
}

pub fn page_is_stale(inputs: &PageInputs, options: &RunOptions) -> bool {
    if options.force_html || inputs.force_regenerate {
        return true;
    }
    match inputs.html_mtime {
        None => true,
        Some(html) => inputs.source_mtime > html || is_newer(inputs.description_mtime, html),
    }
}

/// Inputs deciding whether a directory's index pages must be rewritten.
///
/// The index pages are written as a set, so the set is only as fresh as its
/// oldest page.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexInputs {
    /// Oldest mtime among `index.html` and the overflow pages still needed.
    pub index_mtime: Option<SystemTime>,
    pub description_mtime: Option<SystemTime>,
    pub order_file_mtime: Option<SystemTime>,
    pub parent_order_file_mtime: Option<SystemTime>,
    pub force_regenerate: bool,
    /// An overflow page that should exist is not on disk.
    pub pages_missing: bool,
}

impl IndexInputs {
    /// Collect the inputs for a directory that needs `pages` index pages.
    pub fn for_directory(dir: &DirectoryNode, pages: usize) -> Self {
        let mut index_mtime = dir.index_mtime;
        let mut pages_missing = false;
        for number in 2..=pages {
            match dir
                .numbered_indexes
                .iter()
                .find(|existing| existing.number as usize == number)
            {
                Some(existing) => index_mtime = index_mtime.map(|m| m.min(existing.mtime)),
                None => pages_missing = true,
            }
        }
        Self {
            index_mtime,
            description_mtime: dir.description_mtime,
            order_file_mtime: dir.order_file_mtime,
            parent_order_file_mtime: dir.parent_order_file_mtime,
            force_regenerate: dir.force_regenerate(),
            pages_missing,
        }
    }
}

pub fn index_is_stale(inputs: &IndexInputs, options: &RunOptions) -> bool {
    if options.force_html || inputs.force_regenerate || inputs.pages_missing {
        return true;
    }
    let Some(index) = inputs.index_mtime else {
        return true;
    };
    is_newer(inputs.description_mtime, index)
        || is_newer(inputs.order_file_mtime, index)
        || is_newer(inputs.parent_order_file_mtime, index)
}

/// What [`reconcile_directory`] changed on disk.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Orphaned pages that were deleted.
    pub deleted_pages: Vec<PathBuf>,
}

/// Mtime of the first existing note among the candidates for `name`.
fn note_mtime(texts: &BTreeMap<String, TextNote>, name: &str) -> Option<SystemTime> {
    naming::note_candidates(name)
        .iter()
        .find_map(|candidate| texts.get(candidate))
        .map(|note| note.mtime)
}

/// Reconcile one directory (not its children) against its order files and
/// existing pages.
///
/// Afterwards the directory's collections are in their persisted order with
/// labels attached, every item knows its page name and the mtimes of its
/// page and description, orphaned pages are gone, and `force_regenerate`
/// reflects every structural change found.
pub fn reconcile_directory(dir: &mut DirectoryNode) -> Result<ReconcileReport, ReconcileError> {
    let mut report = ReconcileReport::default();

    let mut existing: HashMap<String, HtmlArtifact> = std::mem::take(&mut dir.html)
        .into_iter()
        .map(|a| (a.name.clone(), a))
        .collect();
    dir.index_mtime = existing
        .remove(&naming::index_file_name(1))
        .map(|a| a.mtime);
    dir.description_mtime = dir
        .texts
        .get(&format!("{}.txt", DIRECTORY_NOTE_STEM))
        .map(|n| n.mtime);

    if !dir.is_empty() || !dir.gpx.is_empty() {
        fs::create_dir_all(dir.meta_dir())?;
    }

    // Ordered collections
    let images = sync_order_file(
        &dir.meta_file(IMAGES_ORDER_FILE),
        std::mem::take(&mut dir.images),
        dir.config.sort_images,
    )?;
    let gpx = sync_order_file(
        &dir.meta_file(GPX_ORDER_FILE),
        std::mem::take(&mut dir.gpx),
        dir.config.sort_images,
    )?;
    let subdirs = sync_order_file(
        &dir.meta_file(DIRECTORIES_ORDER_FILE),
        std::mem::take(&mut dir.subdirs),
        dir.config.sort_directories,
    )?;

    for (what, changed) in [
        ("images", images.changed),
        ("gpx", gpx.changed),
        ("directories", subdirs.changed),
    ] {
        if changed {
            tracing::debug!(dir = %dir.path.display(), "{} changed, regenerating pages", what);
            dir.mark_stale();
        }
    }
    for mtime in [images.order_mtime, gpx.order_mtime, subdirs.order_mtime] {
        dir.note_order_file_mtime(mtime);
    }
    dir.images = images.items;
    dir.gpx = gpx.items;
    dir.subdirs = subdirs.items;

    // Page names are unique across images and tracks together.
    let names: Vec<&str> = dir
        .images
        .iter()
        .map(|i| i.name.as_str())
        .chain(dir.gpx.iter().map(|g| g.name.as_str()))
        .collect();
    let mut page_names = naming::assign_page_names(&names).into_iter();

    // Claim existing pages. An order file edited after a page was written
    // means labels may have changed.
    let mut labels_edited = false;
    for image in dir.images.iter_mut() {
        image.page_name = page_names.next().unwrap_or_default();
        image.description_mtime = note_mtime(&dir.texts, &image.name);
        if let Some(page) = existing.remove(&image.page_name) {
            image.html_mtime = Some(page.mtime);
            labels_edited |= is_newer(images.order_mtime, page.mtime);
        }
    }
    for track in dir.gpx.iter_mut() {
        track.page_name = page_names.next().unwrap_or_default();
        track.description_mtime = note_mtime(&dir.texts, &track.name);
        if let Some(page) = existing.remove(&track.page_name) {
            track.html_mtime = Some(page.mtime);
            labels_edited |= is_newer(gpx.order_mtime, page.mtime);
        }
    }
    if labels_edited {
        tracing::debug!(dir = %dir.path.display(), "order file edited, regenerating pages");
        dir.mark_stale();
    }

    // Whatever is left belongs to no live item.
    let mut orphans: Vec<HtmlArtifact> = existing.into_values().collect();
    orphans.sort_by(|a, b| a.name.cmp(&b.name));
    for orphan in orphans {
        match fs::remove_file(&orphan.path) {
            Ok(()) => report.deleted_pages.push(orphan.path),
            Err(e) => {
                tracing::warn!(
                    path = %orphan.path.display(),
                    error = %e,
                    "cannot delete obsolete page"
                )
            }
        }
        dir.mark_stale();
    }

    let parent_order = dir.order_file_mtime;
    for child in dir.subdirs.iter_mut() {
        child.parent_order_file_mtime = parent_order;
    }

    Ok(report)
}
