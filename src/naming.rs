//! On-disk naming conventions.
//!
//! Every rule about *what a file is called* lives here so the scanner, the
//! staleness pass, and the driver agree on it:
//!
//! | Name | Meaning |
//! |------|---------|
//! | `yapa/` | per-directory metadata directory |
//! | `yapa/images`, `yapa/gpx`, `yapa/directories` | order files |
//! | `yapa/links`, `yapa/config`, `yapa/root` | links manifest, config, root marker |
//! | `yapa/thumbnails/`, `yapa/midnails/` | nail directories |
//! | `index.html`, `index-<n>.html` | paginated index pages |
//! | `<stem>.html` | item page |
//! | `<stem>.txt`, `directory.txt` | description notes |
//!
//! Labels shown to visitors are derived from persisted labels or file names,
//! with underscores rendered as spaces.

use std::collections::HashMap;

/// Name of the metadata directory kept inside every managed directory.
pub const META_DIR: &str = "yapa";

/// Directory names the scanner never descends into.
///
/// The first is our own metadata directory; the other two belong to older
/// gallery tools and must not be mistaken for galleries.
pub const IGNORED_DIRS: &[&str] = &[META_DIR, "picfolio", "GPXViewer"];

pub const IMAGES_ORDER_FILE: &str = "images";
pub const GPX_ORDER_FILE: &str = "gpx";
pub const DIRECTORIES_ORDER_FILE: &str = "directories";
pub const LINKS_FILE: &str = "links";
pub const CONFIG_FILE: &str = "config";
pub const ROOT_FILE: &str = "root";

/// Stem of the note that describes a whole directory.
pub const DIRECTORY_NOTE_STEM: &str = "directory";

/// Label used for the tree root when `gallery-name` is not configured.
pub const DEFAULT_GALLERY_NAME: &str = "Photo Gallery";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Case-insensitive extension check on a bare file name.
pub fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(base, e)| !base.is_empty() && e.eq_ignore_ascii_case(ext))
}

pub fn is_image_name(name: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| has_extension(name, ext))
}

/// File name without its last extension (`a.b.jpg` → `a.b`).
pub fn stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => name,
    }
}

/// Visitor-facing label for a file-backed item.
///
/// A persisted label wins; otherwise the file stem is used. Underscores are
/// shown as spaces either way.
pub fn item_label(label: Option<&str>, name: &str) -> String {
    label.unwrap_or_else(|| stem(name)).replace('_', " ")
}

/// Visitor-facing label for a directory (`None` name means the tree root).
pub fn directory_label(label: Option<&str>, name: Option<&str>) -> String {
    label
        .or(name)
        .unwrap_or(DEFAULT_GALLERY_NAME)
        .replace('_', " ")
}

/// Prefix of the overflow index pages, `index-<n>.html`.
pub const INDEX_PAGE_PREFIX: &str = "index-";

/// File name of the 1-based index page `page`.
pub fn index_file_name(page: usize) -> String {
    if page <= 1 {
        "index.html".to_string()
    } else {
        format!("{}{}.html", INDEX_PAGE_PREFIX, page)
    }
}

/// Parse `index-<n>.html` into `n`. `index.html` itself is not numbered.
pub fn parse_numbered_index(name: &str) -> Option<u32> {
    name.strip_prefix(INDEX_PAGE_PREFIX)?
        .strip_suffix(".html")?
        .parse()
        .ok()
}

/// Candidate note file names for an item, most specific last.
pub fn note_candidates(name: &str) -> [String; 2] {
    [format!("{}.txt", stem(name)), format!("{}.txt", name)]
}

fn reserved_page_stem(stem: &str) -> bool {
    stem == "index" || stem.starts_with(INDEX_PAGE_PREFIX)
}

/// Assign a page file name to every item of a directory.
///
/// Pages are normally `<stem>.html`. When two items share a stem (`a.jpg`
/// next to `a.png` or `a.gpx`), or the stem would collide with an index page,
/// the item falls back to `<file name>.html`. A fallback can in turn clash
/// with another item's stem page (`a.jpg.html` for both `a.jpg` and
/// `a.jpg.png`), so clashing stem pages keep falling back until every page
/// belongs to exactly one item. File names are unique, so this terminates.
pub fn assign_page_names(names: &[&str]) -> Vec<String> {
    let mut stem_counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *stem_counts.entry(stem(name)).or_default() += 1;
    }
    let mut full_name: Vec<bool> = names
        .iter()
        .map(|name| {
            let s = stem(name);
            stem_counts[s] > 1 || reserved_page_stem(s)
        })
        .collect();

    loop {
        let pages: Vec<String> = names
            .iter()
            .zip(&full_name)
            .map(|(name, &full)| {
                if full {
                    format!("{}.html", name)
                } else {
                    format!("{}.html", stem(name))
                }
            })
            .collect();

        let mut page_counts: HashMap<&str, usize> = HashMap::new();
        for page in &pages {
            *page_counts.entry(page.as_str()).or_default() += 1;
        }
        let mut switched = false;
        for (i, page) in pages.iter().enumerate() {
            if page_counts[page.as_str()] > 1 && !full_name[i] {
                full_name[i] = true;
                switched = true;
            }
        }
        if !switched {
            return pages;
        }
    }
}
