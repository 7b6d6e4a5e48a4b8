//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Fixed
//! renditions (the avatar) are created directly; fluid renditions are
//! *planned* here as pure data so the process stage can consult its encode
//! cache before executing each variant.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{fixed_densities, fluid_widths, scaled_height};
use super::params::{FixedParams, Quality, Sharpening};
use crate::types::{FixedImage, FluidImage};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for a fixed rendition request.
#[derive(Debug, Clone)]
pub struct FixedConfig {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl Default for FixedConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            quality: Quality::default(),
            sharpening: Some(Sharpening::light()),
        }
    }
}

/// Create an exact-size rendition with 1x/2x density variants.
///
/// Output files are named `{stem}-{pixel_width}.{ext}` in `output_dir`;
/// URLs are `{url_prefix}/{filename}`. The returned descriptor always
/// reports the *requested* dimensions — cropping and scaling to meet them
/// is the backend's job.
pub fn create_fixed_image(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    stem: &str,
    source_dims: (u32, u32),
    config: &FixedConfig,
    url_prefix: &str,
) -> Result<FixedImage> {
    let ext = output_extension(source);
    let mut srcset_entries = Vec::new();
    let mut src = String::new();

    for (density, width, height) in fixed_densities(config.width, config.height, source_dims.0) {
        let filename = format!("{}-{}.{}", stem, width, ext);
        let output = output_dir.join(&filename);
        backend.fixed(&FixedParams {
            source: source.to_path_buf(),
            output,
            crop_width: width,
            crop_height: height,
            quality: config.quality,
            sharpening: config.sharpening,
        })?;

        let url = format!("{}/{}", url_prefix, filename);
        if density == 1 {
            src = url.clone();
        }
        srcset_entries.push(format!("{} {}x", url, density));
    }

    Ok(FixedImage {
        width: config.width,
        height: config.height,
        src,
        srcset: srcset_entries.join(", "),
    })
}

/// Configuration for fluid rendition generation.
#[derive(Debug, Clone)]
pub struct FluidConfig {
    pub max_width: u32,
    pub quality: Quality,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            max_width: 590,
            quality: Quality::default(),
        }
    }
}

/// One planned fluid variant: filename plus target dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluidVariant {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// A fully planned fluid rendition: the variants to encode and the
/// descriptor the markup layer will use once they exist.
#[derive(Debug, Clone)]
pub struct FluidPlan {
    pub variants: Vec<FluidVariant>,
    pub descriptor: FluidImage,
}

/// Plan the fluid renditions for an inline post image.
///
/// Pure — no I/O. Variant widths come from [`fluid_widths`]; the `sizes`
/// attribute matches the display width (the max width capped at the
/// source). The process stage executes each variant through the backend,
/// consulting its cache first.
pub fn plan_fluid_image(
    source: &Path,
    stem: &str,
    source_dims: (u32, u32),
    config: &FluidConfig,
    url_prefix: &str,
) -> FluidPlan {
    let ext = output_extension(source);
    let widths = fluid_widths(source_dims.0, config.max_width);

    let variants: Vec<FluidVariant> = widths
        .iter()
        .map(|&width| FluidVariant {
            filename: format!("{}-{}.{}", stem, width, ext),
            width,
            height: scaled_height(source_dims, width),
        })
        .collect();

    let srcset = variants
        .iter()
        .map(|v| format!("{}/{} {}w", url_prefix, v.filename, v.width))
        .collect::<Vec<_>>()
        .join(", ");
    // The largest variant is the default src
    let src = variants
        .last()
        .map(|v| format!("{}/{}", url_prefix, v.filename))
        .unwrap_or_default();

    let display_width = config.max_width.min(source_dims.0);
    FluidPlan {
        variants,
        descriptor: FluidImage {
            width: display_width,
            height: scaled_height(source_dims, display_width),
            src,
            srcset,
            sizes: format!("(max-width: {0}px) 100vw, {0}px", display_width),
        },
    }
}

/// Output renditions keep the source format, normalized to lowercase.
fn output_extension(source: &Path) -> String {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_lowercase();
    if ext == "jpeg" { "jpg".to_string() } else { ext }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn fixed_image_generates_both_densities() {
        let backend = MockBackend::new();
        let fixed = create_fixed_image(
            &backend,
            Path::new("/assets/profile-pic.jpg"),
            Path::new("/out/images"),
            "profile-pic",
            (400, 400),
            &FixedConfig::default(),
            "/images",
        )
        .unwrap();

        assert_eq!(fixed.width, 50);
        assert_eq!(fixed.height, 50);
        assert_eq!(fixed.src, "/images/profile-pic-50.jpg");
        assert_eq!(
            fixed.srcset,
            "/images/profile-pic-50.jpg 1x, /images/profile-pic-100.jpg 2x"
        );

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            RecordedOp::Fixed {
                crop_width: 50,
                crop_height: 50,
                sharpening: Some((0.5, 0)),
                ..
            }
        ));
        assert!(matches!(
            &ops[1],
            RecordedOp::Fixed {
                crop_width: 100,
                crop_height: 100,
                ..
            }
        ));
    }

    #[test]
    fn fixed_image_reports_requested_size_for_small_source() {
        let backend = MockBackend::new();
        let fixed = create_fixed_image(
            &backend,
            Path::new("/assets/profile-pic.jpg"),
            Path::new("/out/images"),
            "profile-pic",
            (80, 80),
            &FixedConfig::default(),
            "/images",
        )
        .unwrap();

        // Requested dimensions, not the source's
        assert_eq!((fixed.width, fixed.height), (50, 50));
        // 2x rung dropped: source too small
        assert_eq!(backend.get_operations().len(), 1);
        assert_eq!(fixed.srcset, "/images/profile-pic-50.jpg 1x");
    }

    #[test]
    fn jpeg_extension_normalized() {
        let backend = MockBackend::new();
        let fixed = create_fixed_image(
            &backend,
            Path::new("/assets/profile-pic.JPEG"),
            Path::new("/out"),
            "profile-pic",
            (400, 400),
            &FixedConfig::default(),
            "/images",
        )
        .unwrap();
        assert!(fixed.src.ends_with("profile-pic-50.jpg"));
    }

    #[test]
    fn fluid_plan_caps_variants_at_source_width() {
        let plan = plan_fluid_image(
            Path::new("/blog/post/figure.png"),
            "figure",
            (700, 350),
            &FluidConfig::default(),
            "/images/post",
        );

        // Widths: 147, 295, 590, 700 (885/1180 capped to source, deduped)
        let widths: Vec<u32> = plan.variants.iter().map(|v| v.width).collect();
        assert_eq!(widths, vec![147, 295, 590, 700]);
        assert_eq!(plan.variants[3].filename, "figure-700.png");

        assert_eq!(plan.descriptor.width, 590);
        assert_eq!(plan.descriptor.height, 295);
        assert_eq!(plan.descriptor.src, "/images/post/figure-700.png");
        assert!(plan.descriptor.srcset.contains("figure-147.png 147w"));
        assert!(plan.descriptor.srcset.contains("figure-700.png 700w"));
        assert_eq!(plan.descriptor.sizes, "(max-width: 590px) 100vw, 590px");
    }

    #[test]
    fn fluid_plan_small_source_keeps_native_width() {
        let plan = plan_fluid_image(
            Path::new("/blog/post/small.jpg"),
            "small",
            (300, 200),
            &FluidConfig::default(),
            "/images/post",
        );

        assert_eq!(plan.descriptor.width, 300);
        assert_eq!(plan.descriptor.sizes, "(max-width: 300px) 100vw, 300px");
        assert_eq!(plan.variants.len(), 2);
    }

    #[test]
    fn fluid_plan_heights_scale_proportionally() {
        let plan = plan_fluid_image(
            Path::new("/a.jpg"),
            "a",
            (1000, 500),
            &FluidConfig::default(),
            "/images/p",
        );
        let widths: Vec<u32> = plan.variants.iter().map(|v| v.width).collect();
        let heights: Vec<u32> = plan.variants.iter().map(|v| v.height).collect();
        assert_eq!(widths, vec![147, 295, 590, 885, 1000]);
        // 2:1 aspect, odd widths round up (147 → 73.5 → 74)
        assert_eq!(heights, vec![74, 148, 295, 443, 500]);
    }

    #[test]
    fn fluid_plan_is_pure_and_deterministic() {
        let first = plan_fluid_image(
            Path::new("/a.jpg"),
            "a",
            (2000, 1000),
            &FluidConfig::default(),
            "/images/p",
        );
        let second = plan_fluid_image(
            Path::new("/a.jpg"),
            "a",
            (2000, 1000),
            &FluidConfig::default(),
            "/images/p",
        );
        assert_eq!(first.variants, second.variants);
        assert_eq!(first.descriptor.srcset, second.descriptor.srcset);
    }
}
