//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **EXIF metadata** | custom parser (JPEG APP1, PNG eXIf, TIFF IFDs) |
//! | **Nail** | bounded Lanczos3 resize, or a plain copy when the source fits |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod exif_parser;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_bounded_dimensions;
pub use operations::{NailOutcome, create_nail, nail_dir, nail_path};
pub use params::{NailKind, Quality, ResizeParams};
pub use rust_backend::RustBackend;
