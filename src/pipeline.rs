//! Plugin resolution.
//!
//! Turns the ordered, opaque plugin list from [`config`](crate::config) into
//! a typed [`BuildPlan`] the pipeline stages consume. This is the single
//! place where plugin identifiers and option tables are interpreted:
//!
//! - every identifier must name a known build stage;
//! - every options table must decode into that stage's option struct
//!   (unknown option keys are rejected);
//! - stages that can only appear once must appear at most once.
//!
//! Any violation is fatal to the build — there is no partial resolution or
//! graceful degradation. Entries resolve in list order, which is what makes
//! source ordering meaningful (earlier sources scan first).
//!
//! The nested plugin list of `transformer-markdown` follows the same
//! bare-or-pair shape and the same rules.

use crate::config::PluginSpec;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),
    #[error("invalid options for plugin '{plugin}': {source}")]
    BadOptions {
        plugin: String,
        source: toml::de::Error,
    },
    #[error("plugin '{0}' declared more than once")]
    Duplicate(String),
}

/// The resolved build plan: what each stage does this build.
///
/// Stages not selected by any plugin entry are disabled (or run with
/// defaults where the stage is ambient, like typography).
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    /// Content sources, in declaration order.
    pub sources: Vec<SourceOptions>,
    /// Markdown transformation switches and options.
    pub markdown: MarkdownOptions,
    /// Whether inline post images get responsive renditions.
    pub image_pipeline: bool,
    /// Whether `rss.xml` is generated.
    pub feed: bool,
    /// Web manifest emission; `None` disables `site.webmanifest` and icons.
    pub manifest: Option<ManifestOptions>,
    /// Whether `sw.js` and its registration snippet are generated.
    pub offline: bool,
    /// Typography settings. Always present — pages need a stylesheet even
    /// when the plugin entry is omitted.
    pub typography: TypographyOptions,
}

/// Options for a `source-filesystem` entry. Both fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceOptions {
    /// Directory path relative to the project root.
    pub path: String,
    /// Source name. The `blog` source yields posts; all others yield assets.
    pub name: String,
}

/// Resolved markdown transformation options.
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    pub images: Option<ImagesOptions>,
    pub iframe: Option<IframeOptions>,
    pub highlight: bool,
    pub copy_linked_files: bool,
    pub smartypants: bool,
}

/// Options for `markdown-images`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesOptions {
    /// Maximum display width for inline images, in pixels.
    pub max_width: u32,
    /// Encoding quality for generated renditions (1-100).
    pub quality: u32,
}

impl Default for ImagesOptions {
    fn default() -> Self {
        Self {
            max_width: 590,
            quality: 90,
        }
    }
}

/// Options for `markdown-responsive-iframe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IframeOptions {
    /// Inline style applied to the wrapper element.
    pub wrapper_style: String,
}

impl Default for IframeOptions {
    fn default() -> Self {
        Self {
            wrapper_style: "margin-bottom: 1.0725rem".to_string(),
        }
    }
}

/// Options for `web-manifest`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestOptions {
    pub name: String,
    pub short_name: String,
    pub start_url: String,
    pub background_color: String,
    pub theme_color: String,
    pub display: String,
    /// When false, no apple-touch-icon links are emitted in page heads —
    /// icons come from the web manifest only.
    pub legacy: bool,
    /// Source image for the generated manifest icons, relative to the
    /// project root.
    pub icon: String,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            name: "Sublime Blog".to_string(),
            short_name: "Sublime Blog".to_string(),
            start_url: "/".to_string(),
            background_color: "#ffffff".to_string(),
            theme_color: "#ffffff".to_string(),
            display: "standalone".to_string(),
            legacy: false,
            icon: "content/assets/quasar-square.jpg".to_string(),
        }
    }
}

/// Options for `typography`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypographyOptions {
    /// Root font size in pixels.
    pub base_font_size: f64,
    /// Unitless line height; one rhythm unit is this many rem.
    pub base_line_height: f64,
    /// Never emit a Google Fonts link; fonts are self-hosted.
    pub omit_google_font: bool,
}

impl Default for TypographyOptions {
    fn default() -> Self {
        Self {
            base_font_size: 16.0,
            base_line_height: 1.75,
            omit_google_font: true,
        }
    }
}

/// Nested plugin list carried by `transformer-markdown`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TransformerOptions {
    plugins: Vec<PluginSpec>,
}

/// Resolve the ordered plugin list into a [`BuildPlan`].
pub fn resolve(plugins: &[PluginSpec]) -> Result<BuildPlan, ResolveError> {
    let mut plan = BuildPlan::default();
    let mut seen_markdown = false;
    let mut seen_manifest = false;
    let mut seen_typography = false;

    for spec in plugins {
        match spec.name() {
            "source-filesystem" => {
                plan.sources.push(decode(spec)?);
            }
            "transformer-markdown" => {
                if seen_markdown {
                    return Err(ResolveError::Duplicate(spec.name().to_string()));
                }
                seen_markdown = true;
                let options: TransformerOptions = decode(spec)?;
                plan.markdown = resolve_markdown(&options.plugins)?;
            }
            "image-pipeline" => {
                plan.image_pipeline = true;
            }
            "feed" => {
                plan.feed = true;
            }
            "web-manifest" => {
                if seen_manifest {
                    return Err(ResolveError::Duplicate(spec.name().to_string()));
                }
                seen_manifest = true;
                plan.manifest = Some(decode(spec)?);
            }
            "offline" => {
                plan.offline = true;
            }
            "typography" => {
                if seen_typography {
                    return Err(ResolveError::Duplicate(spec.name().to_string()));
                }
                seen_typography = true;
                plan.typography = decode(spec)?;
            }
            other => return Err(ResolveError::UnknownPlugin(other.to_string())),
        }
    }

    Ok(plan)
}

fn resolve_markdown(plugins: &[PluginSpec]) -> Result<MarkdownOptions, ResolveError> {
    let mut options = MarkdownOptions::default();
    for spec in plugins {
        match spec.name() {
            "markdown-images" => options.images = Some(decode(spec)?),
            "markdown-responsive-iframe" => options.iframe = Some(decode(spec)?),
            "markdown-highlight" => options.highlight = true,
            "markdown-copy-linked-files" => options.copy_linked_files = true,
            "markdown-smartypants" => options.smartypants = true,
            other => return Err(ResolveError::UnknownPlugin(other.to_string())),
        }
    }
    Ok(options)
}

/// Decode a plugin's options table into its option struct.
fn decode<T: DeserializeOwned>(spec: &PluginSpec) -> Result<T, ResolveError> {
    toml::Value::Table(spec.options())
        .try_into()
        .map_err(|source| ResolveError::BadOptions {
            plugin: spec.name().to_string(),
            source,
        })
}
