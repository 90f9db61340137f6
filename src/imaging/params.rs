//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`operations`](super::operations) module (which
//! decides whether and how big a nail should be) and the
//! [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`NailKind`]: the two derivative families, thumbnails and midnails.
//! - [`ResizeParams`]: source, output path, target dimensions, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// A family of downscaled derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NailKind {
    /// Grid listings on index pages.
    Thumbnail,
    /// The single-image view on item pages.
    Midnail,
}

impl NailKind {
    pub const ALL: [NailKind; 2] = [NailKind::Thumbnail, NailKind::Midnail];

    /// Directory under `yapa/` holding this family.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnails",
            Self::Midnail => "midnails",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Midnail => "midnail",
        }
    }
}

/// Parameters for a simple resize operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
