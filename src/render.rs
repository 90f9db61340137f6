//! HTML page rendering.
//!
//! Pure functions from the reconciled tree to [`Markup`]; writing the result
//! to disk is the driver's job. Three kinds of page exist in every gallery
//! directory:
//!
//! - **Index pages** (`index.html`, `index-<n>.html`): sub-galleries, tracks,
//!   and one page worth of thumbnails with a pager.
//! - **Image pages** (`<page name>`): midnail linking to the full image,
//!   prev/next navigation, description, EXIF table and map links.
//! - **Track pages**: label, description and a download link for the GPX file.
//!
//! All links are relative, so a gallery can be moved or served from any
//! prefix. The breadcrumb climbs with `../` one level per ancestor.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::config::SubdirFormat;
use crate::driver::page_of;
use crate::imaging::NailKind;
use crate::metadata::ImageMetadata;
use crate::naming::{self, META_DIR};
use crate::types::{DirectoryNode, ImageItem};
use maud::{DOCTYPE, Markup, html};

const CSS: &str = include_str!("../static/style.css");

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="generator" content=(concat!("gallery-sync ", env!("CARGO_PKG_VERSION")));
                title { (title) }
                style { (CSS) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

fn site_header(breadcrumb: Markup) -> Markup {
    html! {
        header.site-header {
            nav.breadcrumb {
                (breadcrumb)
            }
        }
    }
}

/// Relative link to the first index page `levels_up` directories above.
fn index_href(levels_up: usize) -> String {
    format!("{}index.html", "../".repeat(levels_up))
}

/// Breadcrumb over `trail` (directory labels, root first). With `current`
/// set every directory is a link and `current` closes the trail; without it
/// the last directory is the page itself and stays plain text.
fn breadcrumb(trail: &[String], current: Option<&str>) -> Markup {
    let last = trail.len().saturating_sub(1);
    html! {
        @for (i, label) in trail.iter().enumerate() {
            @if i > 0 { " › " }
            @if i == last && current.is_none() {
                (label)
            } @else {
                a href=(index_href(last - i)) { (label) }
            }
        }
        @if let Some(current) = current {
            " › " (current)
        }
    }
}

fn description_block(description: Option<&str>) -> Markup {
    html! {
        @if let Some(text) = description {
            div.description {
                p {
                    @for line in text.lines() {
                        (line) br;
                    }
                }
            }
        }
    }
}

fn nail_src(kind: NailKind, name: &str) -> String {
    format!("{}/{}/{}", META_DIR, kind.dir_name(), name)
}

/// Link target of the full-size image, relative to the page.
fn full_image_href(image: &ImageItem) -> String {
    match image.source_dir.strip_prefix(&image.output_dir) {
        Ok(rel) if !rel.as_os_str().is_empty() => {
            format!("{}/{}", rel.to_string_lossy(), image.name)
        }
        _ => image.name.clone(),
    }
}

/// `"12 Pictures on 3 Pages"`, singular where it applies.
pub fn picture_count(images: usize, pages: usize) -> String {
    format!(
        "{} {} on {} {}",
        images,
        if images == 1 { "Picture" } else { "Pictures" },
        pages,
        if pages == 1 { "Page" } else { "Pages" }
    )
}

/// Sub-gallery or track listing, laid out per `format`.
fn listing(
    heading: &str,
    format: SubdirFormat,
    columns: u32,
    entries: &[(String, String)],
) -> Markup {
    let columns = columns.max(1) as usize;
    html! {
        section.listing {
            h2 { (heading) }
            @match format {
                SubdirFormat::List => {
                    ul {
                        @for (href, label) in entries {
                            li { a href=(href) { (label) } }
                        }
                    }
                }
                SubdirFormat::Table => {
                    table {
                        @for row in entries.chunks(columns) {
                            tr {
                                @for (href, label) in row {
                                    td { a href=(href) { (label) } }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn pager(page: usize, pages: usize) -> Markup {
    html! {
        div.pager {
            span.prev {
                @if page > 1 {
                    a href=(naming::index_file_name(page - 1)) { b { "<" } }
                }
            }
            span.pages {
                "Page:"
                @for i in 1..=pages {
                    " "
                    @if i == page {
                        b { (i) }
                    } @else {
                        a href=(naming::index_file_name(i)) { (i) }
                    }
                }
            }
            span.next {
                @if page < pages {
                    a href=(naming::index_file_name(page + 1)) { b { ">" } }
                }
            }
        }
    }
}

/// Previous/next links around a centre piece. Missing neighbours leave an
/// empty slot so the centre stays centred.
fn item_nav(prev: Option<(&str, String)>, centre: Markup, next: Option<(&str, String)>) -> Markup {
    html! {
        div.item-nav {
            span.prev {
                @if let Some((href, label)) = &prev {
                    a href=(href) title={ "Previous Picture: " (label) } { "<< Previous" }
                }
            }
            span.centre { (centre) }
            span.next {
                @if let Some((href, label)) = &next {
                    a href=(href) title={ "Next Picture: " (label) } { "Next >>" }
                }
            }
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Renders index page `page` (1-based) of `pages` for `dir`.
///
/// `trail` holds the labels from the root down to `dir` itself.
pub fn render_index_page(
    dir: &DirectoryNode,
    trail: &[String],
    page: usize,
    pages: usize,
    description: Option<&str>,
) -> Markup {
    let title = trail
        .last()
        .cloned()
        .unwrap_or_else(|| naming::directory_label(dir.label.as_deref(), dir.name.as_deref()));
    let config = &dir.config;
    let per_page = config.images_per_page().max(1);
    let columns = config.image_columns.max(1) as usize;
    let start = (page.saturating_sub(1) * per_page).min(dir.images.len());
    let end = (start + per_page).min(dir.images.len());
    let shown = &dir.images[start..end];

    let subdirs: Vec<(String, String)> = dir
        .subdirs
        .iter()
        .map(|d| {
            let name = d.name.clone().unwrap_or_default();
            let label = naming::directory_label(d.label.as_deref(), d.name.as_deref());
            (format!("{}/index.html", name), label)
        })
        .collect();
    let tracks: Vec<(String, String)> = dir
        .gpx
        .iter()
        .map(|g| (g.page_name.clone(), naming::item_label(g.label.as_deref(), &g.name)))
        .collect();

    let content = html! {
        (site_header(breadcrumb(trail, None)))
        main.index-page {
            h1 { (title) }
            (description_block(description))
            @if !subdirs.is_empty() {
                (listing("Sub-Galleries", config.subdir_format, config.subdir_columns, &subdirs))
            }
            @if !tracks.is_empty() {
                (listing("GPS Tracks", config.subdir_format, config.subdir_columns, &tracks))
            }
            @if !dir.images.is_empty() {
                section.images {
                    @if pages > 1 { (pager(page, pages)) }
                    table.thumbnail-grid {
                        @for row in shown.chunks(columns) {
                            tr {
                                @for image in row {
                                    td {
                                        a href=(image.page_name) {
                                            img
                                                src=(nail_src(NailKind::Thumbnail, &image.name))
                                                alt=(image.name);
                                        }
                                        br;
                                        (naming::item_label(image.label.as_deref(), &image.name))
                                    }
                                }
                            }
                        }
                    }
                    @if pages > 1 { (pager(page, pages)) }
                    p.footer { (picture_count(dir.images.len(), pages)) }
                }
            }
        }
    };

    base_document(&title, Some("index-view"), content)
}

/// Renders the page of `dir.images[index]`.
pub fn render_image_page(
    dir: &DirectoryNode,
    trail: &[String],
    index: usize,
    description: Option<&str>,
    metadata: &ImageMetadata,
) -> Markup {
    let image = &dir.images[index];
    let label = naming::item_label(image.label.as_deref(), &image.name);
    let neighbour = |i: usize| {
        dir.images
            .get(i)
            .map(|n| (n.page_name.as_str(), naming::item_label(n.label.as_deref(), &n.name)))
    };
    let prev = index.checked_sub(1).and_then(neighbour);
    let next = neighbour(index + 1);
    let return_page = page_of(index, dir.config.images_per_page());

    let content = html! {
        (site_header(breadcrumb(trail, Some(&label))))
        main.image-page {
            (item_nav(prev.clone(), html! { b { (label) } }, next.clone()))
            figure.image-frame {
                a href=(full_image_href(image)) title="Click on image for full view" {
                    img src=(nail_src(NailKind::Midnail, &image.name)) alt=(label);
                }
            }
            (description_block(description))
            @if !metadata.is_empty() {
                table.exif {
                    @for entry in &metadata.entries {
                        tr {
                            th { (entry.label) }
                            td { (entry.value) }
                        }
                    }
                }
            }
            @if metadata.google_maps_url.is_some() || metadata.openstreetmap_url.is_some() {
                p.map-links {
                    @if let Some(url) = &metadata.google_maps_url {
                        a href=(url) target="_blank" { "Google Maps" }
                    }
                    @if metadata.google_maps_url.is_some() && metadata.openstreetmap_url.is_some() {
                        " / "
                    }
                    @if let Some(url) = &metadata.openstreetmap_url {
                        a href=(url) target="_blank" { "OpenStreetMap" }
                    }
                }
            }
            (item_nav(
                prev,
                html! { a href=(naming::index_file_name(return_page)) { "Return to Index" } },
                next,
            ))
        }
    };

    base_document(&label, Some("image-view"), content)
}

/// Renders the page of `dir.gpx[index]`.
pub fn render_track_page(
    dir: &DirectoryNode,
    trail: &[String],
    index: usize,
    description: Option<&str>,
) -> Markup {
    let track = &dir.gpx[index];
    let label = naming::item_label(track.label.as_deref(), &track.name);

    let content = html! {
        (site_header(breadcrumb(trail, Some(&label))))
        main.track-page {
            h1 { (label) }
            (description_block(description))
            p {
                a href=(track.name) download { "Download GPS track" }
            }
            p {
                a href="index.html" { "Return to Index" }
            }
        }
    };

    base_document(&label, Some("track-view"), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::metadata::MetadataEntry;
    use crate::naming::assign_page_names;
    use crate::types::GpxItem;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn trail(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn directory(images: &[&str]) -> DirectoryNode {
        let path = PathBuf::from("/g/trip");
        let mut dir =
            DirectoryNode::new(path.clone(), Some("trip".into()), GalleryConfig::default());
        let pages = assign_page_names(images);
        for (name, page) in images.iter().zip(pages) {
            let mut item =
                ImageItem::new(*name, path.clone(), path.clone(), SystemTime::UNIX_EPOCH);
            item.page_name = page;
            dir.images.push(item);
        }
        dir
    }

    // =========================================================================
    // Components
    // =========================================================================

    #[test]
    fn base_document_includes_doctype() {
        let content = html! { p { "test" } };
        let doc = base_document("Test", None, content).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Test</title>"));
    }

    #[test]
    fn breadcrumb_climbs_one_level_per_ancestor() {
        let html = breadcrumb(&trail(&["Photo Gallery", "2009", "Rome"]), None).into_string();
        assert!(html.contains(r#"<a href="../../index.html">Photo Gallery</a>"#));
        assert!(html.contains(r#"<a href="../index.html">2009</a>"#));
        assert!(html.ends_with("Rome"));
    }

    #[test]
    fn breadcrumb_on_item_page_links_current_directory() {
        let html = breadcrumb(&trail(&["Photo Gallery", "Rome"]), Some("Forum")).into_string();
        assert!(html.contains(r#"<a href="index.html">Rome</a>"#));
        assert!(html.ends_with("Forum"));
    }

    #[test]
    fn picture_count_wording() {
        assert_eq!(picture_count(1, 1), "1 Picture on 1 Page");
        assert_eq!(picture_count(31, 3), "31 Pictures on 3 Pages");
    }

    #[test]
    fn pager_links_neighbours() {
        let html = pager(2, 3).into_string();
        assert!(html.contains(r#"<a href="index.html"><b>&lt;</b></a>"#));
        assert!(html.contains("<b>2</b>"));
        assert!(html.contains(r#"<a href="index-3.html"><b>&gt;</b></a>"#));

        let first = pager(1, 3).into_string();
        assert!(!first.contains("&lt;"));
    }

    #[test]
    fn linked_image_href_is_relative() {
        let image = ImageItem::new(
            "a.jpg",
            PathBuf::from("/g/trip/../other"),
            PathBuf::from("/g/trip"),
            SystemTime::UNIX_EPOCH,
        );
        assert_eq!(full_image_href(&image), "../other/a.jpg");
    }

    #[test]
    fn html_escape_in_maud() {
        let html = description_block(Some("<script>alert(1)</script>\nsecond")).into_string();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("second<br>"));
    }

    // =========================================================================
    // Page renderer tests
    // =========================================================================

    #[test]
    fn index_page_lists_thumbnails() {
        let dir = directory(&["a.jpg", "b_c.png"]);
        let html =
            render_index_page(&dir, &trail(&["Photo Gallery", "trip"]), 1, 1, None).into_string();

        assert!(
            html.contains(r#"<a href="a.html"><img src="yapa/thumbnails/a.jpg" alt="a.jpg"></a>"#)
        );
        assert!(html.contains("b c"));
        assert!(html.contains("2 Pictures on 1 Page"));
        assert!(!html.contains("Page:"));
    }

    #[test]
    fn index_page_paginates() {
        let names: Vec<String> = (0..17).map(|i| format!("img{:02}.jpg", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let dir = directory(&refs);

        let html = render_index_page(&dir, &trail(&["G"]), 2, 2, None).into_string();
        assert!(html.contains("img15.jpg"));
        assert!(html.contains("img16.jpg"));
        assert!(!html.contains("img14.jpg"));
        assert!(html.contains("Page:"));
        assert!(html.contains("17 Pictures on 2 Pages"));
    }

    #[test]
    fn index_page_subdir_formats() {
        let mut dir = directory(&["a.jpg"]);
        let sub = DirectoryNode::new(
            "/g/trip/day_1".into(),
            Some("day_1".into()),
            GalleryConfig::default(),
        );
        dir.subdirs.push(sub);

        let table = render_index_page(&dir, &trail(&["G"]), 1, 1, None).into_string();
        assert!(table.contains(r#"<td><a href="day_1/index.html">day 1</a></td>"#));

        dir.config.subdir_format = SubdirFormat::List;
        let list = render_index_page(&dir, &trail(&["G"]), 1, 1, None).into_string();
        assert!(list.contains(r#"<li><a href="day_1/index.html">day 1</a></li>"#));
    }

    #[test]
    fn index_page_lists_tracks() {
        let mut dir = directory(&["a.jpg"]);
        let mut track = GpxItem::new("ride.gpx", "/g/trip/ride.gpx".into(), SystemTime::UNIX_EPOCH);
        track.page_name = "ride.html".into();
        track.label = Some("Morning ride".into());
        dir.gpx.push(track);

        let html = render_index_page(&dir, &trail(&["G"]), 1, 1, Some("Our trip")).into_string();
        assert!(html.contains(r#"<a href="ride.html">Morning ride</a>"#));
        assert!(html.contains("Our trip"));
    }

    #[test]
    fn image_page_navigation() {
        let mut dir = directory(&["a.jpg", "b.jpg", "c.jpg"]);
        dir.images[0].label = Some("First".into());
        let html =
            render_image_page(&dir, &trail(&["G", "trip"]), 1, None, &ImageMetadata::default())
                .into_string();

        assert!(html.contains(r#"href="a.html" title="Previous Picture: First""#));
        assert!(html.contains(r#"href="c.html" title="Next Picture: c""#));
        assert!(html.contains(r#"<img src="yapa/midnails/b.jpg" alt="b">"#));
        assert!(html.contains(r#"<a href="b.jpg" title="Click on image for full view">"#));
        assert!(html.contains(r#"<a href="index.html">Return to Index</a>"#));
        assert!(!html.contains(r#"class="exif""#));
    }

    #[test]
    fn image_page_returns_to_its_index_page() {
        let names: Vec<String> = (0..20).map(|i| format!("img{:02}.jpg", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let dir = directory(&refs);

        let html = render_image_page(&dir, &trail(&["G"]), 15, None, &ImageMetadata::default())
            .into_string();
        assert!(html.contains(r#"<a href="index-2.html">Return to Index</a>"#));
    }

    #[test]
    fn image_page_metadata_and_maps() {
        let dir = directory(&["a.jpg"]);
        let metadata = ImageMetadata {
            entries: vec![MetadataEntry {
                label: "Exposure Time".into(),
                value: "1/250 sec.".into(),
            }],
            gps: None,
            google_maps_url: Some("https://maps.google.com/?q=1,2".into()),
            openstreetmap_url: Some("https://www.openstreetmap.org/?mlat=1&mlon=2".into()),
        };

        let html =
            render_image_page(&dir, &trail(&["G"]), 0, Some("At dusk"), &metadata).into_string();
        assert!(html.contains("<th>Exposure Time</th><td>1/250 sec.</td>"));
        assert!(html.contains("Google Maps"));
        assert!(html.contains(" / "));
        assert!(html.contains("mlat=1&amp;mlon=2"));
        assert!(html.contains("At dusk<br>"));
        // A single image has no neighbours.
        assert!(!html.contains("Previous"));
        assert!(!html.contains("Next"));
    }

    #[test]
    fn track_page_links_download() {
        let mut dir = directory(&[]);
        let mut track = GpxItem::new("ride.gpx", "/g/trip/ride.gpx".into(), SystemTime::UNIX_EPOCH);
        track.page_name = "ride.html".into();
        dir.gpx.push(track);

        let html = render_track_page(&dir, &trail(&["G", "trip"]), 0, None).into_string();
        assert!(html.contains("<h1>ride</h1>"));
        assert!(html.contains(r#"<a href="ride.gpx" download>"#));
    }
}
