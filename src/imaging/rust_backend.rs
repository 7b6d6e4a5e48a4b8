//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary — no ImageMagick, no
//! system libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header read, no full decode) |
//! | Decode (JPEG, PNG) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize` with `Lanczos3` |
//! | Fixed rendition | `image::DynamicImage::resize_to_fill` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality-controlled) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{FixedParams, ResizeParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Extensions whose decoders are compiled in and known to work.
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Returns the set of image file extensions the pipeline processes.
pub fn supported_input_extensions() -> &'static [&'static str] {
    PHOTO_EXTENSIONS
}

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

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => save_jpeg(img, path, quality),
        "png" => img.save_with_format(path, ImageFormat::Png).map_err(|e| {
            BackendError::ProcessingFailed(format!("PNG encode failed: {}", e))
        }),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

/// Encode and save as JPEG. Alpha channels are flattened first — the JPEG
/// encoder rejects RGBA input.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to identify {}: {}", path.display(), e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }

    fn fixed(&self, params: &FixedParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let cropped = img.resize_to_fill(params.crop_width, params.crop_height, FilterType::Lanczos3);

        let final_img = match params.sharpening {
            Some(s) => DynamicImage::from(image::imageops::unsharpen(
                &cropped,
                s.sigma,
                s.threshold,
            )),
            None => cropped,
        };

        save_image(&final_img, &params.output, params.quality.value())
    }
}
