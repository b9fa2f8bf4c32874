//! Pure Rust image backend — statically linked, no system codec dependencies.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `image::ImageReader::with_guessed_format` (magic bytes, not extension) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Scale | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Output is always baseline JPEG regardless of the source format. JPEG has
//! no alpha channel, so PNG/WebP sources with transparency are flattened to
//! RGB8 before encoding.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::EncodeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap source bytes in a reader with the format sniffed from magic bytes.
///
/// Phone pickers hand over JPEGs with `.png` names and vice versa, so the
/// extension is never trusted; only content decides the decoder.
fn sniffed_reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(format!("format detection failed: {e}")))
}

/// Encode as baseline JPEG at the given quality, flattening alpha if present.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = sniffed_reader(source)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn scale_and_encode(
        &self,
        source: &[u8],
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        let img = sniffed_reader(source)?
            .decode()
            .map_err(|e| BackendError::Decode(format!("failed to decode source: {e}")))?;
        let scaled = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode_jpeg(&scaled, params.quality.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{ImageEncoder, RgbImage, RgbaImage};

    /// Deterministic noise — compresses poorly, so quality differences show
    /// up clearly in output sizes.
    fn noisy_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let h = x.wrapping_mul(31).wrapping_add(y).wrapping_mul(2654435761);
            image::Rgb([(h >> 16) as u8, (h >> 8) as u8, h as u8])
        })
    }

    /// Encode a small valid JPEG into memory.
    fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = noisy_image(width, height);
        let mut out = Vec::new();
        JpegEncoder::new(&mut out)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    /// Encode a small PNG with an alpha channel into memory.
    fn create_test_rgba_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 64])
        });
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    #[test]
    fn identify_jpeg_dimensions() {
        let jpeg = create_test_jpeg(200, 150);
        let dims = RustBackend::new().identify(&jpeg).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_garbage_errors() {
        let result = RustBackend::new().identify(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn scale_produces_exact_dimensions() {
        let jpeg = create_test_jpeg(400, 300);
        let backend = RustBackend::new();

        let out = backend
            .scale_and_encode(
                &jpeg,
                &EncodeParams {
                    width: 200,
                    height: 150,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        // Output is a JPEG (SOI marker) at exactly the requested size
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        let dims = backend.identify(&out).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn upscales_smaller_source() {
        let jpeg = create_test_jpeg(100, 75);
        let backend = RustBackend::new();

        let out = backend
            .scale_and_encode(
                &jpeg,
                &EncodeParams {
                    width: 200,
                    height: 150,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        let dims = backend.identify(&out).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn rgba_png_flattens_to_jpeg() {
        let png = create_test_rgba_png(120, 90);
        let backend = RustBackend::new();

        let out = backend
            .scale_and_encode(
                &png,
                &EncodeParams {
                    width: 60,
                    height: 45,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        let dims = backend.identify(&out).unwrap();
        assert_eq!(dims.width, 60);
        assert_eq!(dims.height, 45);
    }

    #[test]
    fn lower_quality_encodes_smaller() {
        let jpeg = create_test_jpeg(400, 300);
        let backend = RustBackend::new();
        let params = |q: u8| EncodeParams {
            width: 400,
            height: 300,
            quality: Quality::new(q),
        };

        let high = backend.scale_and_encode(&jpeg, &params(90)).unwrap();
        let low = backend.scale_and_encode(&jpeg, &params(10)).unwrap();
        assert!(
            low.len() < high.len(),
            "q10 ({}) should be smaller than q90 ({})",
            low.len(),
            high.len()
        );
    }

    #[test]
    fn garbage_source_fails_decode_not_encode() {
        let result = RustBackend::new().scale_and_encode(
            b"garbage",
            &EncodeParams {
                width: 100,
                height: 100,
                quality: Quality::new(80),
            },
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}
