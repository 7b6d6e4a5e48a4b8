//! HTML site generation.
//!
//! Stage 3 of the build pipeline. Takes the processed manifest and emits
//! the final static site.
//!
//! ## Generated Pages
//!
//! - **Index page** (`/index.html`): bio block, then the post list
//! - **Post pages** (`/{slug}/index.html`): transformed markdown body with
//!   the bio block and older/newer navigation underneath
//!
//! ## Other Outputs
//!
//! - `rss.xml` when the `feed` plugin is enabled
//! - `site.webmanifest` when the `web-manifest` plugin is configured
//! - `sw.js` plus an inline registration snippet when `offline` is enabled
//! - processed image renditions and icons, copied from the process stage
//! - non-raster assets (the GitHub mark, self-hosted fonts), copied from
//!   the assets source
//! - files referenced from post bodies, copied under `/files/{slug}/`
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── rss.xml
//! ├── site.webmanifest
//! ├── sw.js
//! ├── icon-192.png
//! ├── icon-512.png
//! ├── github-mark.svg
//! ├── images/...
//! └── hello-world/
//!     └── index.html
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping. The
//! stylesheet — typography CSS plus the embedded base styles — is inlined
//! into every page, so pages render with zero extra requests.

use crate::bio::{self, BioData};
use crate::config::SiteMetadata;
use crate::feed;
use crate::markdown;
use crate::offline;
use crate::pipeline::{self, BuildPlan};
use crate::process;
use crate::typography::Typography;
use crate::types::Post;
use crate::webmanifest::WebManifest;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Plugin resolution error: {0}")]
    Resolve(#[from] pipeline::ResolveError),
    #[error("Feed error: {0}")]
    Feed(#[from] feed::FeedError),
    #[error("linked file not found: {0}")]
    LinkedFileNotFound(PathBuf),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Asset extensions the image pipeline consumes; everything else is copied
/// verbatim to the output root.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub fn generate(
    manifest_path: &Path,
    processed_dir: &Path,
    output_dir: &Path,
    source_root: &Path,
    version: &str,
) -> Result<(), GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: process::Manifest = serde_json::from_str(&manifest_content)?;
    let plan = pipeline::resolve(&manifest.config.plugins)?;
    let site = &manifest.config.site;

    let typography = Typography::new(&plan.typography);
    let css = format!("{}\n\n{}", typography.stylesheet(), CSS_STATIC);

    // The bio data dependency, resolved once for the whole build
    let bio_data = BioData {
        avatar: manifest.avatar.clone(),
        author: site.author.clone(),
        social: site.social.clone(),
    };

    fs::create_dir_all(output_dir)?;

    // Processed renditions and icons land at the output root
    copy_dir_recursive(processed_dir, output_dir)?;

    // Non-raster assets (icons' and renditions' sources stay private)
    copy_plain_assets(&manifest, output_dir)?;

    let no_images = BTreeMap::new();

    // Post pages
    for (idx, post) in manifest.posts.iter().enumerate() {
        let post_images = manifest.images.get(&post.slug).unwrap_or(&no_images);
        let transformed = markdown::transform(&post.body, &post.slug, &plan.markdown, post_images);

        copy_linked_files(post, &transformed.linked_files, source_root, output_dir)?;

        // Posts are newest-first: "newer" is the previous entry
        let newer = idx.checked_sub(1).and_then(|i| manifest.posts.get(i));
        let older = manifest.posts.get(idx + 1);

        let page = render_post_page(
            site, &plan, post, &transformed.html, &bio_data, &typography, older, newer, &css,
        );
        let post_dir = output_dir.join(&post.slug);
        fs::create_dir_all(&post_dir)?;
        fs::write(post_dir.join("index.html"), page.into_string())?;
    }
    println!("Generated {} post pages", manifest.posts.len());

    // Index page
    let index = render_index(site, &plan, &manifest.posts, &bio_data, &typography, &css);
    fs::write(output_dir.join("index.html"), index.into_string())?;
    println!("Generated index.html");

    // Feed
    if plan.feed {
        let xml = feed::build_feed(site, &manifest.posts)?;
        fs::write(output_dir.join(feed::FEED_PATH), xml)?;
        println!("Generated {}", feed::FEED_PATH);
    }

    // Web manifest
    if let Some(options) = &plan.manifest {
        let webmanifest = WebManifest::from_options(options);
        fs::write(
            output_dir.join(crate::webmanifest::MANIFEST_PATH),
            webmanifest.to_json(),
        )?;
        println!("Generated {}", crate::webmanifest::MANIFEST_PATH);
    }

    // Service worker
    if plan.offline {
        let precache = precache_urls(&manifest.posts, &plan);
        fs::write(
            output_dir.join(offline::SW_PATH),
            offline::service_worker(version, &precache),
        )?;
        println!("Generated {}", offline::SW_PATH);
    }

    println!("Site generated at {}", output_dir.display());
    Ok(())
}

/// URLs fetched on service worker install: the page shell plus the
/// manifest and icons. Renditions cache lazily on first request.
fn precache_urls(posts: &[Post], plan: &BuildPlan) -> Vec<String> {
    let mut urls = vec!["/".to_string()];
    urls.extend(posts.iter().map(|p| format!("/{}/", p.slug)));
    if plan.feed {
        urls.push(format!("/{}", feed::FEED_PATH));
    }
    if plan.manifest.is_some() {
        urls.push(format!("/{}", crate::webmanifest::MANIFEST_PATH));
        for size in crate::webmanifest::ICON_SIZES {
            urls.push(format!("/icon-{}.png", size));
        }
    }
    urls
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        // Skip the stage manifest and the encode cache
        if name_str.starts_with('.') || name_str == "manifest.json" {
            continue;
        }
        let dst_path = dst.join(&name);

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Copy assets the image pipeline didn't consume (SVGs, fonts) to the
/// output root, preserving their source-relative layout.
fn copy_plain_assets(
    manifest: &process::Manifest,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    for asset in &manifest.assets {
        let ext = Path::new(&asset.rel_path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if RASTER_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        let dst = output_dir.join(&asset.rel_path);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&asset.path, &dst)?;
    }
    Ok(())
}

/// Copy files referenced from a post body into `/files/{slug}/`.
fn copy_linked_files(
    post: &Post,
    linked_files: &[markdown::LinkedFile],
    source_root: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    if linked_files.is_empty() {
        return Ok(());
    }

    let post_dir = source_root
        .join(&post.source_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source_root.to_path_buf());

    for linked in linked_files {
        let source = post_dir.join(&linked.ref_path);
        if !source.is_file() {
            return Err(GenerateError::LinkedFileNotFound(source));
        }
        let dst = output_dir.join(linked.url.trim_start_matches('/'));
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &dst)?;
    }
    Ok(())
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure.
///
/// The head carries the manifest link and theme color (when configured),
/// the feed link, and — only when `legacy` is set — an apple-touch-icon.
fn base_document(
    title: &str,
    site: &SiteMetadata,
    plan: &BuildPlan,
    css: &str,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(site.description);
                @if let Some(manifest) = &plan.manifest {
                    link rel="manifest" href={ "/" (crate::webmanifest::MANIFEST_PATH) };
                    meta name="theme-color" content=(manifest.theme_color);
                    @if manifest.legacy {
                        link rel="apple-touch-icon" href="/icon-192.png";
                    }
                }
                @if plan.feed {
                    link rel="alternate" type="application/rss+xml"
                        title=(site.title) href={ "/" (feed::FEED_PATH) };
                }
                style { (css) }
            }
            body {
                (content)
                @if plan.offline {
                    script { (PreEscaped(offline::REGISTRATION_SNIPPET)) }
                }
            }
        }
    }
}

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the index page: bio block, then the post list.
fn render_index(
    site: &SiteMetadata,
    plan: &BuildPlan,
    posts: &[Post],
    bio_data: &BioData,
    typography: &Typography,
    css: &str,
) -> Markup {
    let content = html! {
        div.page {
            header.site-header {
                h1.site-title { a href="/" { (site.title) } }
            }
            (bio::render_bio(bio_data, typography))
            main {
                @for post in posts {
                    article.post-listing {
                        header {
                            h3 { a href={ "/" (post.slug) "/" } { (post.title) } }
                            @if let Some(date) = post.date {
                                small { (format_date(date)) }
                            }
                        }
                        @if let Some(description) = &post.description {
                            p { (description) }
                        }
                    }
                }
            }
        }
    };

    base_document(&site.title, site, plan, css, content)
}

/// Renders a post page: transformed body, bio footer, older/newer links.
#[allow(clippy::too_many_arguments)]
fn render_post_page(
    site: &SiteMetadata,
    plan: &BuildPlan,
    post: &Post,
    body_html: &str,
    bio_data: &BioData,
    typography: &Typography,
    older: Option<&Post>,
    newer: Option<&Post>,
    css: &str,
) -> Markup {
    let title = format!("{} - {}", post.title, site.title);

    let content = html! {
        div.page {
            header.site-header {
                h3.site-title { a href="/" { (site.title) } }
            }
            main {
                article.post {
                    header {
                        h1 { (post.title) }
                        @if let Some(date) = post.date {
                            small { (format_date(date)) }
                        }
                    }
                    section.post-body {
                        (PreEscaped(body_html))
                    }
                }
                hr;
                (bio::render_bio(bio_data, typography))
                nav.post-nav {
                    ul {
                        @if let Some(older) = older {
                            li.older {
                                a href={ "/" (older.slug) "/" } rel="prev" { "← " (older.title) }
                            }
                        }
                        @if let Some(newer) = newer {
                            li.newer {
                                a href={ "/" (newer.slug) "/" } rel="next" { (newer.title) " →" }
                            }
                        }
                    }
                }
            }
        }
    };

    base_document(&title, site, plan, css, content)
}

// ============================================================================
// Tests
// ============================================================================
