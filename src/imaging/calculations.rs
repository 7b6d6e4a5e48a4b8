//! Pure calculation functions for rendition dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Height of an image scaled proportionally to `target_width`.
///
/// ```
/// # use sublime_blog::imaging::scaled_height;
/// assert_eq!(scaled_height((1200, 800), 590), 393);
/// assert_eq!(scaled_height((100, 100), 50), 50);
/// ```
pub fn scaled_height(dims: (u32, u32), target_width: u32) -> u32 {
    let (width, height) = dims;
    ((target_width as f64) * (height as f64) / (width as f64)).round() as u32
}

/// Rendition widths for a fluid image constrained to `max_width`.
///
/// Candidates are ¼×, ½×, 1×, 1½× and 2× the max width (the larger rungs
/// serve high-density displays), each capped at the source width so nothing
/// is ever upscaled. Returns a sorted, deduplicated list.
///
/// ```
/// # use sublime_blog::imaging::fluid_widths;
/// assert_eq!(fluid_widths(2000, 590), vec![147, 295, 590, 885, 1180]);
/// assert_eq!(fluid_widths(700, 590), vec![147, 295, 590, 700]);
/// assert_eq!(fluid_widths(300, 590), vec![147, 295, 300]);
/// ```
pub fn fluid_widths(source_width: u32, max_width: u32) -> Vec<u32> {
    let candidates = [
        max_width / 4,
        max_width / 2,
        max_width,
        max_width * 3 / 2,
        max_width * 2,
    ];
    let mut widths: Vec<u32> = candidates
        .iter()
        .map(|&w| w.min(source_width))
        .filter(|&w| w > 0)
        .collect();
    widths.sort_unstable();
    widths.dedup();
    widths
}

/// Density variants for a fixed rendition of `width`×`height`.
///
/// Returns `(density, pixel_width, pixel_height)` tuples for 1x and 2x.
/// The 2x rung is dropped when the source is too small to supply it; the
/// 1x rung is always produced (the backend center-crops whatever exists).
///
/// ```
/// # use sublime_blog::imaging::fixed_densities;
/// assert_eq!(fixed_densities(50, 50, 400), vec![(1, 50, 50), (2, 100, 100)]);
/// assert_eq!(fixed_densities(50, 50, 80), vec![(1, 50, 50)]);
/// ```
pub fn fixed_densities(width: u32, height: u32, source_width: u32) -> Vec<(u32, u32, u32)> {
    [1u32, 2]
        .iter()
        .filter(|&&d| d == 1 || width * d <= source_width)
        .map(|&d| (d, width * d, height * d))
        .collect()
}
