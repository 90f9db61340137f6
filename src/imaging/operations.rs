//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a bound, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_bounded_dimensions;
use super::params::{NailKind, Quality, ResizeParams};
use crate::naming::META_DIR;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// What happened when a nail was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum NailOutcome {
    /// The source was downscaled to these dimensions.
    Resized { width: u32, height: u32 },
    /// The source already fit within the bound and was copied unchanged.
    Copied,
}

/// Directory holding the nails of `kind` for images shown in `output_dir`.
pub fn nail_dir(output_dir: &Path, kind: NailKind) -> PathBuf {
    output_dir.join(META_DIR).join(kind.dir_name())
}

/// Nail file for the image `name` shown in `output_dir`. Nails keep the
/// source file name, and so its format.
pub fn nail_path(output_dir: &Path, kind: NailKind, name: &str) -> PathBuf {
    nail_dir(output_dir, kind).join(name)
}

/// Plan a resize without executing it. `None` means the source already fits.
pub fn plan_nail(
    source: &Path,
    output: &Path,
    original: (u32, u32),
    bound: u32,
    quality: Quality,
) -> Option<ResizeParams> {
    let (width, height) = calculate_bounded_dimensions(original, bound)?;
    Some(ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality,
    })
}

/// Produce one nail: downscale `source` into `output` so its longer edge is
/// at most `bound`, or copy it when it already fits.
pub fn create_nail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    bound: u32,
    quality: Quality,
) -> Result<NailOutcome> {
    let dims = backend.identify(source)?;
    match plan_nail(source, output, (dims.width, dims.height), bound, quality) {
        Some(params) => {
            backend.resize(&params)?;
            Ok(NailOutcome::Resized {
                width: params.width,
                height: params.height,
            })
        }
        None => {
            std::fs::copy(source, output)?;
            Ok(NailOutcome::Copied)
        }
    }
}
