//! Minimal EXIF reader for JPEG and PNG files.
//!
//! Walks three TIFF image file directories and collects every entry with a
//! type we know how to decode:
//! - IFD0 (camera make/model, date)
//! - the Exif sub-IFD (tag 0x8769: exposure, aperture, flash, ...)
//! - the GPS sub-IFD (tag 0x8825: latitude/longitude and their refs)
//!
//! For JPEG: reads the APP1 segment starting with `Exif\0\0`.
//! For PNG: reads the `eXIf` chunk.
//!
//! Maker notes are skipped. Any structural problem yields whatever was
//! collected so far; a file without EXIF yields an empty [`ExifTags`].

use std::path::Path;

/// Which directory an entry came from. Tag numbers overlap between the GPS
/// directory and the others, so the pair is the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ifd {
    Primary,
    Exif,
    Gps,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SRational(Vec<(i32, i32)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExifField {
    pub ifd: Ifd,
    pub tag: u16,
    pub value: ExifValue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifTags {
    pub fields: Vec<ExifField>,
}

impl ExifTags {
    pub fn get(&self, ifd: Ifd, tag: u16) -> Option<&ExifValue> {
        self.fields
            .iter()
            .find(|f| f.ifd == ifd && f.tag == tag)
            .map(|f| &f.value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

const EXIF_IFD_POINTER: u16 = 0x8769;
const GPS_IFD_POINTER: u16 = 0x8825;
const MAKER_NOTE: u16 = 0x927C;

/// Read EXIF tags from a file, dispatching by extension.
pub fn read_exif(path: &Path) -> ExifTags {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(_) => return ExifTags::default(),
    };

    let tiff = match ext.as_str() {
        "jpg" | "jpeg" => find_jpeg_app1_exif(&bytes),
        "png" => find_png_exif(&bytes),
        _ => None,
    };

    tiff.map(parse_tiff).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Find the TIFF block inside a JPEG's APP1 Exif segment.
fn find_jpeg_app1_exif(data: &[u8]) -> Option<&[u8]> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS: entropy-coded data follows, no more metadata segments
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + seg_len).min(data.len());
        if seg_len < 2 || seg_start > seg_end {
            return None;
        }

        let segment = &data[seg_start..seg_end];
        if marker == 0xE1 && segment.starts_with(EXIF_HEADER) {
            return Some(&segment[EXIF_HEADER.len()..]);
        }

        pos += 2 + seg_len;
    }
    None
}

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Find the TIFF block stored in a PNG `eXIf` chunk.
fn find_png_exif(data: &[u8]) -> Option<&[u8]> {
    if !data.starts_with(PNG_SIGNATURE) {
        return None;
    }
    let mut pos = PNG_SIGNATURE.len();
    // Chunk: length (4, BE) + type (4) + data + CRC (4)
    while pos + 8 <= data.len() {
        let len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let kind = &data[pos + 4..pos + 8];
        let start = pos + 8;
        let end = start.checked_add(len)?;
        if end > data.len() {
            return None;
        }
        match kind {
            b"eXIf" => return Some(&data[start..end]),
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        pos = end + 4;
    }
    None
}

// ---------------------------------------------------------------------------
// TIFF structure
// ---------------------------------------------------------------------------

/// Parse a TIFF block (byte-order mark onwards) into tags.
fn parse_tiff(data: &[u8]) -> ExifTags {
    let mut tags = ExifTags::default();
    if data.len() < 8 {
        return tags;
    }

    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return tags,
    };
    let reader = TiffReader { data, big_endian };

    if reader.u16_at(2) != Some(42) {
        return tags;
    }
    let Some(ifd0) = reader.u32_at(4) else {
        return tags;
    };

    let pointers = reader.read_ifd(ifd0 as usize, Ifd::Primary, &mut tags);
    if let Some(offset) = pointers.exif {
        reader.read_ifd(offset, Ifd::Exif, &mut tags);
    }
    if let Some(offset) = pointers.gps {
        reader.read_ifd(offset, Ifd::Gps, &mut tags);
    }
    tags
}

#[derive(Default)]
struct SubIfdPointers {
    exif: Option<usize>,
    gps: Option<usize>,
}

struct TiffReader<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl TiffReader<'_> {
    fn bytes<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.data.get(offset..end)?.try_into().ok()
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.bytes::<2>(offset)?;
        Some(if self.big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.bytes::<4>(offset)?;
        Some(if self.big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    }

    /// Read one IFD's entries into `tags`, returning any sub-IFD pointers.
    fn read_ifd(&self, offset: usize, ifd: Ifd, tags: &mut ExifTags) -> SubIfdPointers {
        let mut pointers = SubIfdPointers::default();
        let Some(count) = self.u16_at(offset) else {
            return pointers;
        };

        for i in 0..count as usize {
            let entry = offset + 2 + i * 12;
            let (Some(tag), Some(typ), Some(n)) =
                (self.u16_at(entry), self.u16_at(entry + 2), self.u32_at(entry + 4))
            else {
                break;
            };

            if tag == MAKER_NOTE {
                continue;
            }
            if ifd == Ifd::Primary && (tag == EXIF_IFD_POINTER || tag == GPS_IFD_POINTER) {
                let target = self.u32_at(entry + 8).map(|v| v as usize);
                if tag == EXIF_IFD_POINTER {
                    pointers.exif = target;
                } else {
                    pointers.gps = target;
                }
                continue;
            }

            if let Some(value) = self.read_value(entry, typ, n as usize) {
                tags.fields.push(ExifField { ifd, tag, value });
            }
        }
        pointers
    }

    /// Decode an entry's value. Values of four bytes or fewer are stored
    /// inline in the entry; larger ones at the offset it holds.
    fn read_value(&self, entry: usize, typ: u16, count: usize) -> Option<ExifValue> {
        // TIFF type sizes: count is number of values, not bytes.
        let size = match typ {
            2 => 1,     // ASCII
            3 => 2,     // SHORT
            4 => 4,     // LONG
            5 | 10 => 8, // RATIONAL, SRATIONAL
            _ => return None,
        };
        let byte_len = count.checked_mul(size)?;
        let start = if byte_len <= 4 {
            entry + 8
        } else {
            self.u32_at(entry + 8)? as usize
        };
        let end = start.checked_add(byte_len)?;
        if end > self.data.len() {
            return None;
        }

        let value = match typ {
            2 => {
                let raw = &self.data[start..end];
                let raw = raw.split(|&b| b == 0).next().unwrap_or(raw);
                ExifValue::Ascii(String::from_utf8_lossy(raw).trim().to_string())
            }
            3 => ExifValue::Short(
                (0..count)
                    .filter_map(|i| self.u16_at(start + i * 2))
                    .collect(),
            ),
            4 => ExifValue::Long(
                (0..count)
                    .filter_map(|i| self.u32_at(start + i * 4))
                    .collect(),
            ),
            5 => ExifValue::Rational(
                (0..count)
                    .filter_map(|i| {
                        Some((self.u32_at(start + i * 8)?, self.u32_at(start + i * 8 + 4)?))
                    })
                    .collect(),
            ),
            10 => ExifValue::SRational(
                (0..count)
                    .filter_map(|i| {
                        Some((
                            self.u32_at(start + i * 8)? as i32,
                            self.u32_at(start + i * 8 + 4)? as i32,
                        ))
                    })
                    .collect(),
            ),
            _ => return None,
        };
        Some(value)
    }
}
