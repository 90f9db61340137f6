//! # Gallery Sync
//!
//! An incremental static photo-gallery generator. Point it at a directory
//! tree of photos and it keeps a browsable HTML gallery next to them:
//! thumbnails, a single-image view per photo, and paginated index pages per
//! directory. Re-running it does only the work that changed.
//!
//! # Architecture: Scan, Reconcile, Sync
//!
//! ```text
//! 1. Scan       photos/  →  DirectoryNode tree   (filesystem → typed tree)
//! 2. Reconcile  tree     ←→ yapa/ order files    (persisted order + labels)
//! 3. Sync       tree     →  nails, pages, index  (only what is stale)
//! ```
//!
//! There is no database. The user-editable order files in each directory's
//! `yapa/` folder and the modification times of the generated files are the
//! whole persisted state: an artifact is rebuilt when something it was
//! derived from is newer than it, or when the directory's structure changed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`reconcile`] | Merges scanned names into the persisted order, carries labels, applies the sort policy |
//! | [`scan`] | Classifies one directory's entries, imports linked images, deletes scratch files |
//! | [`tree`] | Finds the gallery root and assembles the owned directory tree with inherited config |
//! | [`types`] | The in-memory tree: `DirectoryNode`, `ImageItem`, `GpxItem`, notes and html artifacts |
//! | [`staleness`] | Mtime-based freshness rules and the per-directory reconciliation pass |
//! | [`driver`] | Produces nails, item pages and index pages; deletes obsolete artifacts |
//! | [`render`] | Maud templates for image, track and index pages |
//! | [`imaging`] | Pure-Rust resize backend, bounded-dimension math, EXIF parsing |
//! | [`metadata`] | EXIF tags to display lines, GPS map links, description notes |
//! | [`config`] | Per-directory `yapa/config` with inheritance, root marker handling |
//! | [`naming`] | File naming conventions shared by every stage |
//! | [`output`] | CLI output formatting for scan inventories and sync progress |
//!
//! # Design Decisions
//!
//! ## Order Files Are User Data
//!
//! `yapa/images`, `yapa/gpx` and `yapa/directories` list one name per line,
//! optionally followed by `@label`. Users reorder and relabel by editing
//! them. The sync only rewrites an order file when the set of names changed
//! or the sort policy demands it; an unchanged file keeps its bytes and its
//! mtime, so a hand edit is detected by comparing that mtime against the
//! generated pages.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. Malformed markup is a build error, interpolation is
//! escaped by default, and there is no template directory to ship.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module decodes and resizes with the `image` crate and reads
//! EXIF with a small built-in TIFF parser. No system libraries are needed.

pub mod config;
pub mod driver;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod reconcile;
pub mod render;
pub mod scan;
pub mod staleness;
pub mod tree;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
