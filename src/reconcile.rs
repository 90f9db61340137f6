//! Ordered-set reconciliation.
//!
//! Every ordered collection of a directory (images, GPX tracks,
//! subdirectories) has a persisted order file in the metadata directory:
//!
//! ```text
//! sunset.jpg@Sunset over the bay
//! harbour.jpg
//! dawn.jpg@Dawn
//! ```
//!
//! One entry per line, `name[@label]`, split at the first `@`. The file is
//! user-editable: reordering lines reorders the gallery, and labels replace
//! the file-name-derived caption.
//!
//! [`reconcile`] merges a fresh scan into that curated order. Entries whose
//! item disappeared are dropped; items with no entry are new and are placed
//! according to [`SortPolicy`]. Either kind of difference reports `changed`,
//! which the staleness pass turns into a directory-wide rebuild.

use crate::types::Named;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// How new entries are merged into a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortPolicy {
    /// New entries are appended in scan order.
    None,
    /// New entries are sorted by name and appended after the curated prefix.
    AppendNewSorted,
    /// The whole list is sorted by name on every run.
    AlwaysSorted,
}

impl SortPolicy {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::AppendNewSorted),
            2 => Some(Self::AlwaysSorted),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::AppendNewSorted => 1,
            Self::AlwaysSorted => 2,
        }
    }
}

/// One line of an order file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    pub name: String,
    pub label: Option<String>,
}

impl OrderEntry {
    pub fn new(name: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            name: name.into(),
            label: label.map(str::to_string),
        }
    }
}

/// An order file as read from disk.
#[derive(Debug, Clone)]
pub struct OrderFile {
    pub entries: Vec<OrderEntry>,
    pub mtime: SystemTime,
}

/// Result of merging a scan into a persisted order.
#[derive(Debug)]
pub struct Reconciled<T> {
    pub items: Vec<T>,
    /// Something was added or removed, or the order had to be re-sorted.
    pub changed: bool,
}

/// Parse order-file text. Blank lines are skipped; surrounding whitespace
/// and an empty label (`name@`) are dropped.
pub fn parse_order(text: &str) -> Vec<OrderEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (name, label) = match line.split_once('@') {
                Some((name, label)) => (name.trim(), Some(label.trim())),
                None => (line, None),
            };
            if name.is_empty() {
                return None;
            }
            Some(OrderEntry::new(name, label.filter(|l| !l.is_empty())))
        })
        .collect()
}

pub fn format_order<T: Named>(items: &[T]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(item.name());
        if let Some(label) = item.label() {
            out.push('@');
            out.push_str(label);
        }
        out.push('\n');
    }
    out
}

/// Read an order file. A missing or unreadable file means "no prior state".
pub fn read_order_file(path: &Path) -> Option<OrderFile> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read order file, ignoring"
                );
            }
            return None;
        }
    };
    let mtime = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(OrderFile {
        entries: parse_order(&text),
        mtime,
    })
}

/// Write `items` as an order file and return the file's new mtime.
pub fn write_order_file<T: Named>(path: &Path, items: &[T]) -> Result<SystemTime, ReconcileError> {
    fs::write(path, format_order(items))?;
    Ok(fs::metadata(path)?.modified()?)
}

/// Remove an order file. A file that is already gone is not an error.
pub fn remove_order_file(path: &Path) -> Result<(), ReconcileError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Merge the scanned `current` items into the `persisted` order.
///
/// Persisted entries keep their position and lend their label to the
/// matching item. Entries without a match, or naming an item already placed,
/// are dropped. Unmatched items are new and are placed per `policy`. Every
/// item of `current` appears exactly once in the output.
pub fn reconcile<T: Named>(
    persisted: &[OrderEntry],
    current: Vec<T>,
    policy: SortPolicy,
) -> Reconciled<T> {
    let index: HashMap<String, usize> = current
        .iter()
        .enumerate()
        .map(|(i, item)| (item.name().to_string(), i))
        .collect();
    let mut slots: Vec<Option<T>> = current.into_iter().map(Some).collect();
    let mut items = Vec::with_capacity(slots.len());
    let mut changed = false;

    for entry in persisted {
        match index.get(&entry.name).and_then(|&i| slots[i].take()) {
            Some(mut item) => {
                item.set_label(entry.label.clone());
                items.push(item);
            }
            None => changed = true,
        }
    }

    let mut new_items: Vec<T> = slots.into_iter().flatten().collect();
    if !new_items.is_empty() {
        changed = true;
        if policy == SortPolicy::AppendNewSorted {
            new_items.sort_by(|a, b| a.name().cmp(b.name()));
        }
        items.extend(new_items);
    }

    if policy == SortPolicy::AlwaysSorted && !is_sorted_by_name(&items) {
        items.sort_by(|a, b| a.name().cmp(b.name()));
        changed = true;
    }

    Reconciled { items, changed }
}

fn is_sorted_by_name<T: Named>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0].name() <= w[1].name())
}

/// Outcome of [`sync_order_file`].
#[derive(Debug)]
pub struct SyncedOrder<T> {
    pub items: Vec<T>,
    pub changed: bool,
    /// Mtime of the order file after syncing, `None` when there is none.
    pub order_mtime: Option<SystemTime>,
}

/// Reconcile `current` against the order file at `path` and persist the
/// result when it changed.
///
/// An empty collection removes the order file instead of writing an empty
/// one.
pub fn sync_order_file<T: Named>(
    path: &Path,
    current: Vec<T>,
    policy: SortPolicy,
) -> Result<SyncedOrder<T>, ReconcileError> {
    let persisted = read_order_file(path);
    let (entries, mut order_mtime) = match persisted {
        Some(file) => (file.entries, Some(file.mtime)),
        None => (Vec::new(), None),
    };

    let Reconciled { items, changed } = reconcile(&entries, current, policy);

    if items.is_empty() {
        if order_mtime.is_some() {
            remove_order_file(path)?;
        }
        order_mtime = None;
    } else if changed {
        tracing::debug!(path = %path.display(), "writing order file");
        order_mtime = Some(write_order_file(path, &items)?);
    }

    Ok(SyncedOrder {
        items,
        changed,
        order_mtime,
    })
}
