//! Shared types serialized between pipeline stages.
//!
//! These types travel through the JSON manifests (scan → process → generate)
//! and must deserialize identically in every stage that reads them.

use serde::{Deserialize, Serialize};

/// A blog post discovered during the scan stage.
///
/// The markdown `body` is carried raw through the pipeline; it is only
/// transformed to HTML during generation, once the process stage has
/// produced the image renditions the transformed markup refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// URL slug: `content/blog/hello-world/index.md` → `hello-world`
    pub slug: String,
    /// Front-matter title, first `# heading`, or slug with dashes → spaces
    pub title: String,
    /// Publication date from front-matter; undated posts sort last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::NaiveDate>,
    /// Front-matter description, shown in the index list and the feed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw markdown body (front-matter stripped)
    pub body: String,
    /// Source file path relative to the project root
    pub source_path: String,
}

/// A file discovered under a non-blog content source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Absolute path — the query target for [`find_asset`](crate::scan::find_asset)
    pub path: String,
    /// Path relative to the source root, used for output placement
    pub rel_path: String,
    /// Name of the source that yielded this asset (e.g. `assets`)
    pub source: String,
}

/// An exact-size image rendition with density variants.
///
/// This is the value handed straight to the image markup: the renderer
/// treats it as opaque and never recomputes dimensions from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedImage {
    pub width: u32,
    pub height: u32,
    /// 1x rendition URL
    pub src: String,
    /// Density srcset, e.g. `/images/profile-pic-50.jpg 1x, /images/profile-pic-100.jpg 2x`
    pub srcset: String,
}

/// A width-constrained image with responsive variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidImage {
    /// Display width — the configured max width, capped at the source width
    pub width: u32,
    /// Height at the display width
    pub height: u32,
    /// Default rendition URL (the largest variant)
    pub src: String,
    /// Width srcset, e.g. `/images/post/fig-295.jpg 295w, /images/post/fig-590.jpg 590w`
    pub srcset: String,
    /// `sizes` attribute matching the layout max width
    pub sizes: String,
}
