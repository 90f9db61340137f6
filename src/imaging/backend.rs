//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the sync engine
//! needs: identify, read_metadata, and resize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording [`tests::MockBackend`].

use super::params::ResizeParams;
use crate::metadata::ImageMetadata;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The source could not be decoded. The image is skipped, the run goes on.
    #[error("Cannot read image {0}")]
    Unreadable(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read embedded EXIF metadata. Files without metadata yield an empty
    /// [`ImageMetadata`].
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Execute a resize operation, writing `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
