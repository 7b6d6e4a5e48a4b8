//! Image processing.
//!
//! Stage 2 of the build pipeline. Takes the manifest from the scan stage
//! and produces every image rendition the site needs:
//!
//! - the **bio avatar**, an exact 50×50 fixed rendition with 1x/2x density
//!   variants — the bio component's data dependency, resolved here so the
//!   render stage receives it as a plain value;
//! - **inline post images**, width-constrained responsive variants for
//!   every relative image reference in a post body (when the image
//!   pipeline plugin is enabled);
//! - **web manifest icons** (192 and 512 PNG) when the web-manifest plugin
//!   is configured.
//!
//! ## Output Structure
//!
//! ```text
//! processed/
//! ├── manifest.json               # Updated manifest with rendition data
//! ├── .cache-manifest.json        # Encode cache (see cache module)
//! ├── icon-192.png
//! ├── icon-512.png
//! └── images/
//!     ├── profile-pic-50.jpg      # Avatar renditions
//!     ├── profile-pic-100.jpg
//!     └── hello-world/            # Per-post fluid variants
//!         ├── figure-147.jpg
//!         ├── figure-295.jpg
//!         └── figure-590.jpg
//! ```
//!
//! ## Caching and Parallelism
//!
//! Fluid variants are the expensive part: they are encoded in parallel
//! across posts with rayon, and each variant consults the content-addressed
//! [`cache`](crate::cache) first. Dimension reads and the avatar always
//! run — they are cheap and keep metadata changes instant.

use crate::bio;
use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::SiteConfig;
use crate::imaging::{
    BackendError, FixedConfig, FixedParams, FluidConfig, ImageBackend, Quality, ResizeParams,
    RustBackend, create_fixed_image, get_dimensions, plan_fluid_image,
};
use crate::markdown;
use crate::pipeline::{self, ManifestOptions};
use crate::scan;
use crate::types::{Asset, FixedImage, FluidImage, Post};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Plugin resolution error: {0}")]
    Resolve(#[from] pipeline::ResolveError),
    #[error("bad asset pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("no asset matches the avatar pattern {0:?}")]
    AvatarNotFound(String),
    #[error("source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("web manifest icon source not found: {0}")]
    IconNotFound(PathBuf),
}

/// Raster formats the rendition pipeline handles. Anything else (GIF, SVG)
/// falls through to copy-linked-files.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Manifest output from the process stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub posts: Vec<Post>,
    pub assets: Vec<Asset>,
    /// The bio avatar, fixed at 50×50.
    pub avatar: FixedImage,
    /// Fluid renditions: post slug → normalized reference → descriptor.
    pub images: BTreeMap<String, BTreeMap<String, FluidImage>>,
    pub config: SiteConfig,
}

/// Result of a process run: the manifest plus cache statistics.
#[derive(Debug)]
pub struct ProcessResult {
    pub manifest: Manifest,
    pub cache_stats: CacheStats,
}

pub fn process(
    scan_manifest_path: &Path,
    root: &Path,
    processed_dir: &Path,
    use_cache: bool,
) -> Result<ProcessResult, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, scan_manifest_path, root, processed_dir, use_cache)
}

/// Process images using a specific backend (allows testing with a mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    scan_manifest_path: &Path,
    root: &Path,
    processed_dir: &Path,
    use_cache: bool,
) -> Result<ProcessResult, ProcessError> {
    let manifest_content = std::fs::read_to_string(scan_manifest_path)?;
    let input: scan::Manifest = serde_json::from_str(&manifest_content)?;
    let plan = pipeline::resolve(&input.config.plugins)?;

    let images_dir = processed_dir.join("images");
    std::fs::create_dir_all(&images_dir)?;

    let cache = Mutex::new(if use_cache {
        CacheManifest::load(processed_dir)
    } else {
        CacheManifest::empty()
    });
    let mut stats = CacheStats::default();

    // The avatar is unconditional: the bio block appears on every page
    let avatar = process_avatar(backend, &input.assets, &images_dir)?;

    // Fluid renditions for inline post images, in parallel across posts
    let images_options = plan.markdown.images.clone().unwrap_or_default();
    let fluid_config = FluidConfig {
        max_width: images_options.max_width,
        quality: Quality::new(images_options.quality),
    };

    let mut images = BTreeMap::new();
    if plan.image_pipeline {
        let per_post: Result<Vec<_>, ProcessError> = input
            .posts
            .par_iter()
            .map(|post| {
                process_post_images(backend, post, root, processed_dir, &fluid_config, &cache)
            })
            .collect();

        for (slug, post_images, post_stats) in per_post? {
            stats.merge(&post_stats);
            if !post_images.is_empty() {
                images.insert(slug, post_images);
            }
        }
    }

    // Web manifest icons
    if let Some(manifest_options) = &plan.manifest {
        process_icons(backend, manifest_options, root, processed_dir)?;
    }

    let cache = cache.into_inner().expect("cache mutex poisoned");
    cache.save(processed_dir)?;

    Ok(ProcessResult {
        manifest: Manifest {
            posts: input.posts,
            assets: input.assets,
            avatar,
            images,
            config: input.config,
        },
        cache_stats: stats,
    })
}

/// Resolve the avatar asset by its path pattern and create the fixed
/// rendition the bio component requires.
fn process_avatar(
    backend: &impl ImageBackend,
    assets: &[Asset],
    images_dir: &Path,
) -> Result<FixedImage, ProcessError> {
    let asset = scan::find_asset(assets, bio::AVATAR_PATTERN)?
        .ok_or_else(|| ProcessError::AvatarNotFound(bio::AVATAR_PATTERN.to_string()))?;

    let source = PathBuf::from(&asset.path);
    if !source.exists() {
        return Err(ProcessError::SourceNotFound(source));
    }

    let dims = get_dimensions(backend, &source)?;
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "avatar".to_string());

    let config = FixedConfig {
        width: bio::AVATAR_WIDTH,
        height: bio::AVATAR_HEIGHT,
        ..FixedConfig::default()
    };

    Ok(create_fixed_image(
        backend, &source, images_dir, &stem, dims, &config, "/images",
    )?)
}

/// Encode the fluid variants one post's body references.
fn process_post_images(
    backend: &impl ImageBackend,
    post: &Post,
    root: &Path,
    processed_dir: &Path,
    fluid_config: &FluidConfig,
    cache: &Mutex<CacheManifest>,
) -> Result<(String, BTreeMap<String, FluidImage>, CacheStats), ProcessError> {
    let mut post_images = BTreeMap::new();
    let mut stats = CacheStats::default();

    let post_dir = root
        .join(&post.source_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());

    for reference in markdown::collect_image_refs(&post.body) {
        let ext = Path::new(&reference)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !RASTER_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let source = post_dir.join(&reference);
        if !source.exists() {
            return Err(ProcessError::SourceNotFound(source));
        }

        let dims = get_dimensions(backend, &source)?;
        let stem = Path::new(&reference)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| reference.clone());
        let url_prefix = format!("/images/{}", post.slug);
        let fluid_plan = plan_fluid_image(&source, &stem, dims, fluid_config, &url_prefix);

        let out_dir = processed_dir.join("images").join(&post.slug);
        std::fs::create_dir_all(&out_dir)?;

        let source_hash = cache::hash_file(&source)?;
        for variant in &fluid_plan.variants {
            let rel_path = format!("images/{}/{}", post.slug, variant.filename);
            let params_hash =
                cache::hash_fluid_params(variant.width, fluid_config.quality.value());

            let cached = {
                let cache = cache.lock().expect("cache mutex poisoned");
                cache.find_cached(&source_hash, &params_hash, processed_dir)
            };

            match cached {
                Some(stored) if stored == rel_path => stats.hit(),
                Some(stored) => {
                    // Same content under an old path (post renamed): copy
                    // instead of re-encoding
                    std::fs::copy(processed_dir.join(&stored), processed_dir.join(&rel_path))?;
                    stats.copy();
                }
                None => {
                    backend.resize(&ResizeParams {
                        source: source.clone(),
                        output: out_dir.join(&variant.filename),
                        width: variant.width,
                        height: variant.height,
                        quality: fluid_config.quality,
                    })?;
                    stats.miss();
                }
            }

            let mut cache = cache.lock().expect("cache mutex poisoned");
            cache.insert(rel_path, source_hash.clone(), params_hash);
        }

        post_images.insert(reference, fluid_plan.descriptor);
    }

    Ok((post.slug.clone(), post_images, stats))
}

/// Generate the square PNG icons the web manifest declares.
fn process_icons(
    backend: &impl ImageBackend,
    options: &ManifestOptions,
    root: &Path,
    processed_dir: &Path,
) -> Result<(), ProcessError> {
    let source = root.join(&options.icon);
    if !source.exists() {
        return Err(ProcessError::IconNotFound(source));
    }

    for size in crate::webmanifest::ICON_SIZES {
        backend.fixed(&FixedParams {
            source: source.clone(),
            output: processed_dir.join(format!("icon-{}.png", size)),
            crop_width: *size,
            crop_height: *size,
            quality: Quality::default(),
            sharpening: None,
        })?;
    }
    Ok(())
}
