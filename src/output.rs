//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The `scan` inventory leads every entity with its position and visitor-facing
//! label; file names follow as secondary context. Sync progress is one line
//! per unit of work, naming the file touched.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Photo Gallery (2 images)
//!     001 dawn
//!     002 Old harbour (harbour.jpg)
//!     Tracks
//!     001 ride
//!     001 Rome (12 images)
//!         001 forum
//! ```
//!
//! ## Sync
//!
//! ```text
//! Entering directory /srv/photos/rome
//! Delete obsolete html file gone.html
//! Create thumbnail for forum.jpg (128x96)
//! Create midnail for forum.jpg (640x480)
//! Create html file for forum.jpg
//! Create index file index.html
//! Synced 4 directories: 2 nails created, 1 page and 1 index page written, 1 file deleted
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::driver::{SyncEvent, SyncSummary};
use crate::imaging::NailOutcome;
use crate::naming;
use crate::types::DirectoryNode;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", n, if n == 1 { singular } else { plural })
}

/// Item line: a custom label shows the file name in parens, a derived one
/// does not (it *is* the file name).
///
/// ```text
/// 001 dawn
/// 002 Old harbour (harbour.jpg)
/// ```
fn item_line(index: usize, label: Option<&str>, name: &str) -> String {
    let shown = naming::item_label(label, name);
    match label {
        Some(l) if !l.is_empty() => format!("{} {} ({})", format_index(index), shown, name),
        _ => format!("{} {}", format_index(index), shown),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the assembled tree as an inventory.
pub fn format_tree(root: &DirectoryNode) -> Vec<String> {
    let mut lines = Vec::new();
    let title = naming::directory_label(root.label.as_deref(), root.name.as_deref());
    lines.push(directory_header(&title, root));
    format_directory_body(root, 1, &mut lines);
    lines
}

fn directory_header(title: &str, dir: &DirectoryNode) -> String {
    if dir.images.is_empty() {
        title.to_string()
    } else {
        format!("{} ({})", title, plural(dir.images.len(), "image", "images"))
    }
}

fn format_directory_body(dir: &DirectoryNode, depth: usize, lines: &mut Vec<String>) {
    let pad = indent(depth);
    for (i, image) in dir.images.iter().enumerate() {
        lines.push(format!("{}{}", pad, item_line(i + 1, image.label.as_deref(), &image.name)));
        if image.is_linked() {
            lines.push(format!("{}    Source: {}", pad, image.source_path().display()));
        }
    }
    if !dir.gpx.is_empty() {
        lines.push(format!("{}Tracks", pad));
        for (i, track) in dir.gpx.iter().enumerate() {
            lines.push(format!("{}{}", pad, item_line(i + 1, track.label.as_deref(), &track.name)));
        }
    }
    for (i, sub) in dir.subdirs.iter().enumerate() {
        let title = naming::directory_label(sub.label.as_deref(), sub.name.as_deref());
        lines.push(format!(
            "{}{} {}",
            pad,
            format_index(i + 1),
            directory_header(&title, sub)
        ));
        format_directory_body(sub, depth + 1, lines);
    }
}

pub fn print_tree(root: &DirectoryNode) {
    for line in format_tree(root) {
        println!("{}", line);
    }
}

// ============================================================================
// Sync output
// ============================================================================

/// Format one progress event.
pub fn format_sync_event(event: &SyncEvent) -> Vec<String> {
    let line = match event {
        SyncEvent::RootCreated { path } => {
            format!("Create root configuration in {}", path.display())
        }
        SyncEvent::EnteringDirectory { path } => {
            format!("Entering directory {}", path.display())
        }
        SyncEvent::ObsoleteHtmlDeleted { path } => {
            format!("Delete obsolete html file {}", file_name(path))
        }
        SyncEvent::NailCreated {
            kind,
            name,
            outcome,
        } => match outcome {
            NailOutcome::Resized { width, height } => {
                format!("Create {} for {} ({}x{})", kind.label(), name, width, height)
            }
            NailOutcome::Copied => format!("Create {} for {} (copied)", kind.label(), name),
        },
        SyncEvent::ObsoleteNailDeleted { kind, path } => {
            format!("Delete obsolete {} {}", kind.label(), file_name(path))
        }
        SyncEvent::StrayNailFileDeleted { kind, path } => {
            format!("Delete stray file {} from {}", file_name(path), kind.dir_name())
        }
        SyncEvent::PageWritten { item, .. } => format!("Create html file for {}", item),
        SyncEvent::IndexWritten { path } => format!("Create index file {}", file_name(path)),
        SyncEvent::OrphanIndexDeleted { path } => {
            format!("Delete obsolete index file {}", file_name(path))
        }
    };
    vec![line]
}

pub fn format_summary(summary: &SyncSummary) -> Vec<String> {
    let directories = plural(summary.directories, "directory", "directories");
    if summary.is_noop() {
        return vec![format!("{} up to date", directories)];
    }
    vec![format!(
        "Synced {}: {} created, {} and {} written, {} deleted",
        directories,
        plural(summary.nails_created, "nail", "nails"),
        plural(summary.pages_written, "page", "pages"),
        plural(summary.index_pages_written, "index page", "index pages"),
        plural(summary.files_deleted, "file", "files"),
    )]
}

pub fn print_summary(summary: &SyncSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::imaging::NailKind;
    use crate::types::{GpxItem, ImageItem};
    use std::path::PathBuf;
    use std::time::SystemTime;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn item_line_with_and_without_label() {
        assert_eq!(item_line(1, None, "old_harbour.jpg"), "001 old harbour");
        assert_eq!(item_line(2, Some("Dawn"), "a.jpg"), "002 Dawn (a.jpg)");
    }

    // =========================================================================
    // Scan output
    // =========================================================================

    fn image(dir: &str, name: &str) -> ImageItem {
        ImageItem::new(name, PathBuf::from(dir), PathBuf::from(dir), SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn tree_inventory() {
        let mut root = DirectoryNode::new("/g".into(), None, GalleryConfig::default());
        root.images.push(image("/g", "dawn.jpg"));
        root.gpx.push(GpxItem::new("ride.gpx", "/g/ride.gpx".into(), SystemTime::UNIX_EPOCH));
        let mut rome =
            DirectoryNode::new("/g/rome".into(), Some("rome".into()), GalleryConfig::default());
        rome.label = Some("Rome".into());
        let mut linked = ImageItem::new(
            "forum.jpg",
            "/g/rome/../shared".into(),
            "/g/rome".into(),
            SystemTime::UNIX_EPOCH,
        );
        linked.label = Some("The Forum".into());
        rome.images.push(linked);
        root.subdirs.push(rome);

        let lines = format_tree(&root);
        assert_eq!(
            lines,
            vec![
                "Photo Gallery (1 image)",
                "    001 dawn",
                "    Tracks",
                "    001 ride",
                "    001 Rome (1 image)",
                "        001 The Forum (forum.jpg)",
                "            Source: /g/rome/../shared/forum.jpg",
            ]
        );
    }

    // =========================================================================
    // Sync output
    // =========================================================================

    #[test]
    fn sync_event_lines() {
        let cases = [
            (
                SyncEvent::RootCreated { path: "/g".into() },
                "Create root configuration in /g",
            ),
            (
                SyncEvent::EnteringDirectory { path: "/g/rome".into() },
                "Entering directory /g/rome",
            ),
            (
                SyncEvent::ObsoleteHtmlDeleted { path: "/g/gone.html".into() },
                "Delete obsolete html file gone.html",
            ),
            (
                SyncEvent::NailCreated {
                    kind: NailKind::Thumbnail,
                    name: "a.jpg".into(),
                    outcome: NailOutcome::Resized { width: 128, height: 96 },
                },
                "Create thumbnail for a.jpg (128x96)",
            ),
            (
                SyncEvent::NailCreated {
                    kind: NailKind::Midnail,
                    name: "a.jpg".into(),
                    outcome: NailOutcome::Copied,
                },
                "Create midnail for a.jpg (copied)",
            ),
            (
                SyncEvent::StrayNailFileDeleted {
                    kind: NailKind::Thumbnail,
                    path: "/g/yapa/thumbnails/x.db".into(),
                },
                "Delete stray file x.db from thumbnails",
            ),
            (
                SyncEvent::PageWritten {
                    item: "a.jpg".into(),
                    path: "/g/a.html".into(),
                },
                "Create html file for a.jpg",
            ),
            (
                SyncEvent::IndexWritten { path: "/g/index-2.html".into() },
                "Create index file index-2.html",
            ),
            (
                SyncEvent::OrphanIndexDeleted { path: "/g/index-9.html".into() },
                "Delete obsolete index file index-9.html",
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(format_sync_event(&event), vec![expected.to_string()]);
        }
    }

    #[test]
    fn summary_lines() {
        let idle = SyncSummary {
            directories: 3,
            ..SyncSummary::default()
        };
        assert_eq!(format_summary(&idle), vec!["3 directories up to date"]);

        let one = SyncSummary {
            directories: 1,
            ..SyncSummary::default()
        };
        assert_eq!(format_summary(&one), vec!["1 directory up to date"]);

        let busy = SyncSummary {
            directories: 1,
            pages_written: 2,
            ..SyncSummary::default()
        };
        assert_eq!(
            format_summary(&busy),
            vec!["Synced 1 directory: 0 nails created, 2 pages and 0 index pages written, 0 files deleted"]
        );
    }
}
