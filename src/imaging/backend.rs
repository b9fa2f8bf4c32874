//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and scale-and-encode. Backends work on in-memory bytes,
//! not paths — the pipeline owns all I/O, so a backend can run against bytes
//! from a file, an HTTP download, or a test fixture without caring which.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, statically
//! linked, no system codec dependencies.

use super::params::EncodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Both operations take the *original* source bytes. The compression loop
/// re-encodes from the source on every attempt, so repeated
/// [`scale_and_encode`](ImageBackend::scale_and_encode) calls at descending
/// quality never compound lossy artifacts from earlier attempts.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without a full decode where the format allows it.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode the source, scale to `params` dimensions, encode as JPEG.
    fn scale_and_encode(
        &self,
        source: &[u8],
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError>;
}
