//! Image metadata shown on item pages.
//!
//! Two sources feed an image page besides the picture itself:
//!
//! ## Description notes
//!
//! A plain-text file next to the image, `<stem>.txt` (or `<name>.txt`).
//! Its content is shown verbatim, one line per line. `directory.txt` does the
//! same for an index page.
//!
//! ## Embedded EXIF
//!
//! A fixed set of camera fields is turned into human-readable label/value
//! pairs, in this order:
//!
//! | Label | EXIF tag |
//! |-------|----------|
//! | Camera Maker | Make |
//! | Camera Model | Model |
//! | Date and Time Taken | DateTime (DateTimeOriginal as fallback) |
//! | Exposure Time | ExposureTime |
//! | Aperture | FNumber, else ApertureValue |
//! | Exposure Program | ExposureProgram |
//! | ISO | ISOSpeedRatings |
//! | Exposure Bias | ExposureBiasValue |
//! | Metering Mode | MeteringMode |
//! | Flash Status | Flash |
//! | Focal Length | FocalLength |
//! | White Balance | WhiteBalance |
//! | Exposure Mode | ExposureMode |
//! | GPS Position | GPSLatitude/GPSLongitude + refs |
//!
//! A GPS position additionally yields Google Maps and OpenStreetMap links.

use crate::imaging::exif_parser::{ExifTags, ExifValue, Ifd};
use serde::Serialize;
use std::path::Path;

/// Upper bound on the number of label/value pairs kept per image.
pub const MAX_ENTRIES: usize = 18;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataEntry {
    pub label: String,
    pub value: String,
}

/// A decimal-degree position; south and west are negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageMetadata {
    pub entries: Vec<MetadataEntry>,
    pub gps: Option<GpsPosition>,
    pub google_maps_url: Option<String>,
    pub openstreetmap_url: Option<String>,
}

impl ImageMetadata {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read a description note and return its trimmed contents.
/// Returns `None` if the file doesn't exist or is empty.
pub fn read_note(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// EXIF → label/value pairs
// ---------------------------------------------------------------------------

const MAKE: u16 = 0x010F;
const MODEL: u16 = 0x0110;
const DATE_TIME: u16 = 0x0132;
const EXPOSURE_TIME: u16 = 0x829A;
const F_NUMBER: u16 = 0x829D;
const EXPOSURE_PROGRAM: u16 = 0x8822;
const ISO_SPEED: u16 = 0x8827;
const DATE_TIME_ORIGINAL: u16 = 0x9003;
const APERTURE_VALUE: u16 = 0x9202;
const EXPOSURE_BIAS: u16 = 0x9204;
const METERING_MODE: u16 = 0x9207;
const FLASH: u16 = 0x9209;
const FOCAL_LENGTH: u16 = 0x920A;
const EXPOSURE_MODE: u16 = 0xA402;
const WHITE_BALANCE: u16 = 0xA403;

const GPS_LATITUDE_REF: u16 = 1;
const GPS_LATITUDE: u16 = 2;
const GPS_LONGITUDE_REF: u16 = 3;
const GPS_LONGITUDE: u16 = 4;

/// Build the page metadata from raw EXIF tags.
pub fn summarize(tags: &ExifTags) -> ImageMetadata {
    let mut entries = Vec::new();
    let mut push = |label: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            entries.push(MetadataEntry {
                label: label.to_string(),
                value,
            });
        }
    };

    let primary = |tag| tags.get(Ifd::Primary, tag);
    let exif = |tag| tags.get(Ifd::Exif, tag);

    push("Camera Maker", primary(MAKE).and_then(ascii));
    push("Camera Model", primary(MODEL).and_then(ascii));
    push(
        "Date and Time Taken",
        primary(DATE_TIME)
            .or_else(|| exif(DATE_TIME_ORIGINAL))
            .and_then(ascii),
    );
    push("Exposure Time", exif(EXPOSURE_TIME).and_then(exposure_time));
    push(
        "Aperture",
        exif(F_NUMBER)
            .and_then(f_number)
            .or_else(|| exif(APERTURE_VALUE).and_then(aperture_value)),
    );
    push(
        "Exposure Program",
        exif(EXPOSURE_PROGRAM).and_then(|v| enumerated(v, exposure_program_name)),
    );
    push("ISO", exif(ISO_SPEED).and_then(first_integer).map(|n| n.to_string()));
    push("Exposure Bias", exif(EXPOSURE_BIAS).and_then(exposure_bias));
    push(
        "Metering Mode",
        exif(METERING_MODE).and_then(|v| enumerated(v, metering_mode_name)),
    );
    push("Flash Status", exif(FLASH).and_then(first_integer).map(flash_status));
    push("Focal Length", exif(FOCAL_LENGTH).and_then(focal_length));
    push(
        "White Balance",
        exif(WHITE_BALANCE).and_then(|v| enumerated(v, white_balance_name)),
    );
    push(
        "Exposure Mode",
        exif(EXPOSURE_MODE).and_then(|v| enumerated(v, exposure_mode_name)),
    );

    let gps = gps_position(tags);
    push("GPS Position", gps.map(|p| p.to_string()));

    entries.truncate(MAX_ENTRIES);
    ImageMetadata {
        entries,
        gps,
        google_maps_url: gps.map(|p| google_maps_url(&p)),
        openstreetmap_url: gps.map(|p| openstreetmap_url(&p)),
    }
}

fn ascii(value: &ExifValue) -> Option<String> {
    match value {
        ExifValue::Ascii(s) => Some(s.clone()),
        _ => None,
    }
}

fn first_integer(value: &ExifValue) -> Option<u32> {
    match value {
        ExifValue::Short(v) => v.first().map(|&n| n as u32),
        ExifValue::Long(v) => v.first().copied(),
        _ => None,
    }
}

fn first_ratio(value: &ExifValue) -> Option<f64> {
    match value {
        ExifValue::Rational(v) => v
            .first()
            .filter(|(_, d)| *d != 0)
            .map(|&(n, d)| n as f64 / d as f64),
        ExifValue::SRational(v) => v
            .first()
            .filter(|(_, d)| *d != 0)
            .map(|&(n, d)| n as f64 / d as f64),
        _ => None,
    }
}

fn exposure_time(value: &ExifValue) -> Option<String> {
    let seconds = first_ratio(value)?;
    if seconds <= 0.0 {
        return None;
    }
    Some(if seconds < 1.0 {
        format!("1/{} sec.", (1.0 / seconds).round() as u32)
    } else {
        format!("{} sec.", format_decimal(seconds, 1))
    })
}

fn f_number(value: &ExifValue) -> Option<String> {
    first_ratio(value).map(|f| format!("f/{:.1}", f))
}

/// ApertureValue is in APEX units: f-number = 2^(Av / 2).
fn aperture_value(value: &ExifValue) -> Option<String> {
    first_ratio(value).map(|av| format!("f/{:.1}", 2f64.powf(av / 2.0)))
}

fn exposure_bias(value: &ExifValue) -> Option<String> {
    first_ratio(value).map(|ev| format!("{:.2} EV", ev))
}

fn focal_length(value: &ExifValue) -> Option<String> {
    first_ratio(value).map(|mm| format!("{:.1} mm", mm))
}

fn enumerated(value: &ExifValue, name: fn(u32) -> Option<&'static str>) -> Option<String> {
    let code = first_integer(value)?;
    Some(name(code).map_or_else(|| code.to_string(), str::to_string))
}

fn exposure_program_name(code: u32) -> Option<&'static str> {
    Some(match code {
        0 => "Not defined",
        1 => "Manual",
        2 => "Normal program",
        3 => "Aperture priority",
        4 => "Shutter priority",
        5 => "Creative program (biased toward depth of field)",
        6 => "Action program (biased toward fast shutter speed)",
        7 => "Portrait mode (for closeup photos with the background out of focus)",
        8 => "Landscape mode (for landscape photos with the background in focus)",
        _ => return None,
    })
}

fn metering_mode_name(code: u32) -> Option<&'static str> {
    Some(match code {
        0 => "Unknown",
        1 => "Average",
        2 => "Center-weighted average",
        3 => "Spot",
        4 => "Multi spot",
        5 => "Pattern",
        6 => "Partial",
        255 => "Other",
        _ => return None,
    })
}

fn white_balance_name(code: u32) -> Option<&'static str> {
    match code {
        0 => Some("Auto white balance"),
        1 => Some("Manual white balance"),
        _ => None,
    }
}

fn exposure_mode_name(code: u32) -> Option<&'static str> {
    match code {
        0 => Some("Auto exposure"),
        1 => Some("Manual exposure"),
        2 => Some("Auto bracket"),
        _ => None,
    }
}

/// Flash is a bit field: bit 0 fired, bits 1-2 strobe return, bits 3-4
/// mode, bit 5 no flash function, bit 6 red-eye reduction.
fn flash_status(code: u32) -> String {
    if code & 0x20 != 0 {
        return "No flash function".to_string();
    }
    let mut parts = vec![if code & 0x01 != 0 {
        "Flash fired"
    } else {
        "Flash did not fire"
    }];
    match (code >> 3) & 0x03 {
        1 => parts.push("compulsory flash mode"),
        2 => parts.push("compulsory flash suppression"),
        3 => parts.push("auto mode"),
        _ => {}
    }
    match (code >> 1) & 0x03 {
        2 => parts.push("return light not detected"),
        3 => parts.push("return light detected"),
        _ => {}
    }
    if code & 0x40 != 0 {
        parts.push("red-eye reduction mode");
    }
    parts.join(", ")
}

/// Format `x` with at most `max_decimals` fraction digits, trailing zeros
/// removed.
fn format_decimal(x: f64, max_decimals: usize) -> String {
    let s = format!("{:.*}", max_decimals, x);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// GPS
// ---------------------------------------------------------------------------

fn dms_to_decimal(value: &ExifValue) -> Option<f64> {
    let ExifValue::Rational(parts) = value else {
        return None;
    };
    if parts.len() < 3 || parts.iter().any(|&(_, d)| d == 0) {
        return None;
    }
    let [d, m, s] = [0, 1, 2].map(|i| parts[i].0 as f64 / parts[i].1 as f64);
    Some(d + m / 60.0 + s / 3600.0)
}

fn gps_position(tags: &ExifTags) -> Option<GpsPosition> {
    let gps = |tag| tags.get(Ifd::Gps, tag);
    let lat = dms_to_decimal(gps(GPS_LATITUDE)?)?;
    let lon = dms_to_decimal(gps(GPS_LONGITUDE)?)?;
    let lat_ref = gps(GPS_LATITUDE_REF).and_then(ascii)?;
    let lon_ref = gps(GPS_LONGITUDE_REF).and_then(ascii)?;

    Some(GpsPosition {
        latitude: if lat_ref.starts_with('S') { -lat } else { lat },
        longitude: if lon_ref.starts_with('W') { -lon } else { lon },
    })
}

/// Whole degrees, whole minutes and seconds (two decimals) of `|x|`.
fn to_dms(x: f64) -> (u32, u32, f64) {
    let x = x.abs();
    let mut deg = x.trunc() as u32;
    let minutes = (x - x.trunc()) * 60.0;
    let mut min = minutes.trunc() as u32;
    let mut sec = ((minutes - minutes.trunc()) * 60.0 * 100.0).round() / 100.0;
    if sec >= 60.0 {
        sec = 0.0;
        min += 1;
    }
    if min >= 60 {
        min = 0;
        deg += 1;
    }
    (deg, min, sec)
}

impl GpsPosition {
    pub fn latitude_ref(&self) -> char {
        if self.latitude < 0.0 { 'S' } else { 'N' }
    }

    pub fn longitude_ref(&self) -> char {
        if self.longitude < 0.0 { 'W' } else { 'E' }
    }
}

impl std::fmt::Display for GpsPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (ad, am, asec) = to_dms(self.latitude);
        let (od, om, osec) = to_dms(self.longitude);
        write!(
            f,
            "{}° {}' {}'' {}, {}° {}' {}'' {}",
            ad,
            am,
            format_decimal(asec, 2),
            self.latitude_ref(),
            od,
            om,
            format_decimal(osec, 2),
            self.longitude_ref()
        )
    }
}

/// Google Maps search URL for a position, degrees/minutes/seconds encoded.
pub fn google_maps_url(p: &GpsPosition) -> String {
    let (ad, am, asec) = to_dms(p.latitude);
    let (od, om, osec) = to_dms(p.longitude);
    format!(
        "http://maps.google.de/maps?f=q&hl=de&q=+{}%C2%B0{}%27{}%22{}+++{}%C2%B0{}%27{}%22{}&ie=UTF8&z=12&om=1&z=15&iwloc=addr",
        ad,
        am,
        format_decimal(asec, 2),
        p.latitude_ref(),
        od,
        om,
        format_decimal(osec, 2),
        p.longitude_ref()
    )
}

pub fn openstreetmap_url(p: &GpsPosition) -> String {
    format!(
        "http://www.openstreetmap.org/?mlat={}&mlon={}&zoom=15",
        format_decimal(p.latitude, 6),
        format_decimal(p.longitude, 6)
    )
}
