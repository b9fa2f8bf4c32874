//! High-level compression operation.
//!
//! Combines calculations with backend execution: compute the target
//! dimensions once, then walk quality down until the encoded bytes fit the
//! byte budget or the quality floor is reached.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::scaled_dimensions;
use super::params::{EncodeParams, Quality};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Settings for a compression run.
///
/// Defaults reproduce the stock pipeline: 800px wide, 1 MiB budget, quality
/// walking 80 → 10 in steps of 10.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Output width in pixels; height follows the source aspect ratio.
    pub target_width: u32,
    /// Byte budget the encoded image should fit within.
    pub max_bytes: u64,
    /// Quality of the first encode attempt.
    pub initial_quality: Quality,
    /// Quality percentage points dropped between attempts.
    pub quality_step: u8,
    /// Lowest quality the walk will try. Reaching it ends the walk even if
    /// the candidate is still over budget (soft cap).
    pub quality_floor: Quality,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            target_width: 800,
            max_bytes: 1024 * 1024,
            initial_quality: Quality::new(80),
            quality_step: 10,
            quality_floor: Quality::new(10),
        }
    }
}

/// One encode attempt in the quality walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub quality: Quality,
    pub size_bytes: u64,
}

/// Outcome of a compression run: the winning bytes plus the attempt trail.
#[derive(Debug, Clone)]
pub struct Compressed {
    /// JPEG bytes of the last attempt.
    pub bytes: Vec<u8>,
    /// Quality the final attempt was encoded at.
    pub quality: Quality,
    /// Dimensions of the original source.
    pub source: Dimensions,
    /// Dimensions of the encoded output.
    pub output: Dimensions,
    /// Every attempt made, in order. Never empty.
    pub attempts: Vec<Attempt>,
    /// False when even the floor attempt stayed over budget.
    pub within_limit: bool,
}

impl Compressed {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Compress `source` to fit `config.max_bytes`.
///
/// Encodes at `initial_quality`, then re-encodes at progressively lower
/// quality until the candidate fits the budget or quality reaches the floor.
/// Every attempt decodes the *original* source bytes — a candidate is never
/// fed back into the encoder, so artifacts do not compound across attempts.
///
/// The floor is a soft cap: when the floor attempt is still over budget the
/// run succeeds anyway with `within_limit = false` and the caller decides
/// what to do with an oversized result.
pub fn compress_to_limit(
    backend: &impl ImageBackend,
    source: &[u8],
    config: &CompressionConfig,
) -> Result<Compressed> {
    let source_dims = backend.identify(source)?;
    let (width, height) =
        scaled_dimensions((source_dims.width, source_dims.height), config.target_width);
    // A zero step would never terminate
    let step = config.quality_step.max(1);

    let mut quality = config.initial_quality;
    let mut params = EncodeParams {
        width,
        height,
        quality,
    };
    let mut bytes = backend.scale_and_encode(source, &params)?;
    let mut attempts = vec![Attempt {
        quality,
        size_bytes: bytes.len() as u64,
    }];

    while bytes.len() as u64 > config.max_bytes && quality > config.quality_floor {
        quality = quality.step_down(step).max(config.quality_floor);
        params.quality = quality;
        bytes = backend.scale_and_encode(source, &params)?;
        attempts.push(Attempt {
            quality,
            size_bytes: bytes.len() as u64,
        });
        tracing::debug!(
            quality = quality.percent(),
            size_bytes = bytes.len(),
            "re-encoded candidate"
        );
    }

    let within_limit = bytes.len() as u64 <= config.max_bytes;
    if !within_limit {
        tracing::warn!(
            quality = quality.percent(),
            size_bytes = bytes.len(),
            max_bytes = config.max_bytes,
            "quality floor reached while over budget"
        );
    }

    Ok(Compressed {
        bytes,
        quality,
        source: source_dims,
        output: Dimensions { width, height },
        attempts,
        within_limit,
    })
}
