//! Image compression — pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` (header read, no full decode) |
//! | **Scale** | Lanczos3 `resize_exact` to a fixed 800px-class width |
//! | **Encode** | baseline JPEG via `image::codecs::jpeg` |
//! | **Fit budget** | [`compress_to_limit`] quality walk (80 → 10 by default) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing encode attempts
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The compression loop combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::scaled_dimensions;
pub use operations::{Attempt, Compressed, CompressionConfig, compress_to_limit};
pub use params::{EncodeParams, Quality};
pub use rust_backend::RustBackend;
