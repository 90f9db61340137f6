//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `original` so its longer edge fits within `bound`, preserving the
/// aspect ratio.
///
/// Returns `None` when the image already fits: nails are never upscaled, and
/// an image that fits is used as-is.
///
/// # Examples
/// ```
/// # use gallery_sync::imaging::calculate_bounded_dimensions;
/// // 4000x3000 landscape bounded to 640 → 640x480
/// assert_eq!(calculate_bounded_dimensions((4000, 3000), 640), Some((640, 480)));
///
/// // already small enough
/// assert_eq!(calculate_bounded_dimensions((600, 400), 640), None);
/// ```
pub fn calculate_bounded_dimensions(original: (u32, u32), bound: u32) -> Option<(u32, u32)> {
    let (w, h) = original;
    let longest = w.max(h);
    if longest == 0 {
        return None;
    }

    if bound >= longest {
        return None;
    }

    // floor(edge * bound / longest), in integers so the longer edge lands
    // exactly on `bound`.
    let scale = |edge: u32| ((edge as u64 * bound as u64 / longest as u64) as u32).max(1);
    Some((scale(w), scale(h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_bounded_by_width() {
        assert_eq!(calculate_bounded_dimensions((4000, 3000), 640), Some((640, 480)));
    }

    #[test]
    fn portrait_bounded_by_height() {
        assert_eq!(calculate_bounded_dimensions((3000, 4000), 128), Some((96, 128)));
    }

    #[test]
    fn dimensions_round_down() {
        // 1000x333 → scale 0.128 → 128 x 42.624
        assert_eq!(calculate_bounded_dimensions((1000, 333), 128), Some((128, 42)));
    }

    #[test]
    fn exact_fit_is_not_resized() {
        assert_eq!(calculate_bounded_dimensions((640, 480), 640), None);
    }

    #[test]
    fn smaller_image_is_never_upscaled() {
        assert_eq!(calculate_bounded_dimensions((100, 50), 640), None);
    }

    #[test]
    fn extreme_panorama_keeps_one_pixel() {
        assert_eq!(calculate_bounded_dimensions((10000, 10), 100), Some((100, 1)));
    }

    #[test]
    fn zero_sized_image_is_left_alone() {
        assert_eq!(calculate_bounded_dimensions((0, 0), 100), None);
    }
}
