//! # Sublime Blog
//!
//! The static site generator behind a personal blog: markdown posts in,
//! fully static site out. Site metadata and the build pipeline are declared
//! once in `site.toml` — an ordered list of build-stage plugins wired
//! around the content — and a single `build` run produces HTML pages,
//! responsive images, an RSS feed, a web app manifest, and an offline
//! service worker.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Content flows through three independent stages, each producing a JSON
//! manifest that the next stage consumes:
//!
//! ```text
//! 1. Scan      content/  →  manifest.json    (filesystem → structured data)
//! 2. Process   manifest  →  processed/       (avatar, renditions, icons)
//! 3. Generate  manifest  →  dist/            (final HTML site)
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Debuggability**: each manifest is human-readable JSON you can inspect.
//! - **Incremental builds**: the process stage skips encodes whose inputs
//!   haven't changed (see [`cache`]).
//! - **Testability**: scan and generate are functions from manifest to
//!   manifest, and process runs against a backend trait, so tests exercise
//!   pipeline logic without encoding real images.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` loading: site metadata + the ordered plugin list |
//! | [`pipeline`] | resolves plugin identifiers and option tables into a typed build plan |
//! | [`scan`] | Stage 1 — walks content sources, parses post front-matter, records assets |
//! | [`process`] | Stage 2 — avatar, responsive post images, manifest icons |
//! | [`generate`] | Stage 3 — renders pages with Maud, emits feed/manifest/service worker |
//! | [`markdown`] | markdown → HTML with responsive images, iframe wrapping, code classes |
//! | [`imaging`] | pure-Rust image operations: identify, resize, fixed renditions |
//! | [`cache`] | content-addressed encode cache for incremental builds |
//! | [`typography`] | rhythm unit and generated site CSS, self-hosted fonts |
//! | [`bio`] | the author bio block: avatar, biography paragraph, profile links |
//! | [`feed`] | RSS channel generation |
//! | [`webmanifest`] | `site.webmanifest` emission |
//! | [`offline`] | generated service worker + registration snippet |
//! | [`types`] | shared types serialized between stages |
//!
//! # Design Decisions
//!
//! ## Declarative Plugin List
//!
//! The pipeline is configured as data: an ordered list where each entry is
//! either a bare stage name or a name with an options table. The
//! configuration layer treats options as opaque and only guarantees
//! ordering; [`pipeline::resolve`] is the single interpreter, and an
//! unknown name or malformed table fails the build outright. There is no
//! plugin ABI — every stage is compiled in — but the site's wiring reads
//! and diffs like configuration, not code.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system, rather than Handlebars or Tera. Malformed HTML is a
//! build error, template variables are Rust expressions, interpolation is
//! auto-escaped, and there is no template directory to ship or get out of
//! sync.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling) for
//! every rendition. No ImageMagick, no libvips, no system dependencies: a
//! single binary builds the site on any machine. Renditions keep the
//! source format — the blog serves JPEG and PNG, nothing more exotic.
//!
//! ## Stale-While-Revalidate Service Worker
//!
//! Every build ships a PWA: a web manifest and a service worker caching
//! the page shell, serving from cache while refreshing in the background.
//! The cache is versioned by the build version string, so deploys
//! invalidate old caches automatically. Legacy apple-touch-icon links are
//! off by default — the manifest's two PNG icons are enough, and every
//! page stays lighter for it.
//!
//! ## Self-Hosted Typography
//!
//! All spacing derives from a single rhythm unit ([`typography`]), and the
//! generated CSS declares `@font-face` rules for fonts served from the
//! site itself. No Google Fonts link is ever emitted.

pub mod bio;
pub mod cache;
pub mod config;
pub mod feed;
pub mod generate;
pub mod imaging;
pub mod markdown;
pub mod offline;
pub mod pipeline;
pub mod process;
pub mod scan;
pub mod typography;
pub mod types;
pub mod webmanifest;
