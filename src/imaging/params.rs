//! Parameter types for image operations.
//!
//! These structs say *what* to encode, not *how*. They sit between
//! [`operations`](super::operations) (which runs the compression loop) and
//! the [`backend`](super::backend) (which does the pixel work), so a mock
//! backend can stand in for the real one without touching loop logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`EncodeParams`] — Full specification for one encode attempt: target dimensions + quality.

/// Quality setting for lossy JPEG encoding (1-100).
///
/// Stored as an integer percent. Callers coming from fractional quality
/// scales (0.0–1.0) should use [`Quality::from_fraction`]; keeping the
/// internal representation integral means a descending quality ladder
/// (80, 70, 60, ...) never accumulates float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Build from a fractional quality in `0.0..=1.0` (e.g. `0.8` → 80).
    pub fn from_fraction(fraction: f32) -> Self {
        Self::new((fraction * 100.0).round() as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn fraction(self) -> f32 {
        f32::from(self.0) / 100.0
    }

    /// Lower quality by `step`, saturating at the bottom of the valid range.
    pub fn step_down(self, step: u8) -> Self {
        Self::new(self.0.saturating_sub(step))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Parameters for a single scale-and-encode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    pub quality: Quality,
}
