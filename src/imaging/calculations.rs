//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions for a fixed-width scale.
///
/// The width is pinned to `target_width` and the height follows from the
/// source aspect ratio, rounded to the nearest pixel. Sources narrower than
/// the target are scaled *up*: a fixed output width keeps downstream display
/// layout predictable, which matters more here than preserving tiny sources.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target_width` - Output width in pixels
///
/// # Examples
/// ```
/// # use snapship::imaging::scaled_dimensions;
/// // Portrait phone photo down to 800 wide
/// assert_eq!(scaled_dimensions((3024, 4032), 800), (800, 1067));
///
/// // Small source scales up
/// assert_eq!(scaled_dimensions((400, 300), 800), (800, 600));
/// ```
pub fn scaled_dimensions(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let ratio = target_width as f64 / src_w as f64;
    // Degenerate aspect ratios (very wide strips) round to 0; clamp to 1px
    let height = (src_h as f64 * ratio).round().max(1.0) as u32;
    (target_width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_source() {
        // 1600x900 → 800 wide keeps 16:9
        assert_eq!(scaled_dimensions((1600, 900), 800), (800, 450));
    }

    #[test]
    fn portrait_source_rounds_height() {
        // 3024x4032 → 800x1066.67 rounds to 1067
        assert_eq!(scaled_dimensions((3024, 4032), 800), (800, 1067));
    }

    #[test]
    fn square_source() {
        assert_eq!(scaled_dimensions((2000, 2000), 800), (800, 800));
    }

    #[test]
    fn exact_width_is_identity() {
        assert_eq!(scaled_dimensions((800, 600), 800), (800, 600));
    }

    #[test]
    fn narrow_source_upscales() {
        assert_eq!(scaled_dimensions((400, 300), 800), (800, 600));
    }

    #[test]
    fn extreme_strip_clamps_height_to_one() {
        // 10000x1 at 800 wide would round height to 0
        assert_eq!(scaled_dimensions((10000, 1), 800), (800, 1));
    }
}
