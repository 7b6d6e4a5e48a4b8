//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. The configuration
//! is a single immutable record read once at the start of a build: site
//! metadata (title, author, canonical URL, social handles) plus an ordered
//! list of build-stage plugins.
//!
//! ## Config File
//!
//! `site.toml` lives in the project root, next to `content/`:
//!
//! ```toml
//! [site]
//! title = "Sublime Blog"
//! author = "Enerqi"
//! description = "Software, Programming, Tech"
//! site_url = "https://blog.sublime.is/"
//!
//! [site.social]
//! twitter = "none"              # "none" means no account
//! github = "https://github.com/enerqi"
//! ```
//!
//! ## Plugins
//!
//! Each plugin entry is either a bare identifier or an identifier with an
//! options table — no other shape is valid:
//!
//! ```toml
//! plugins = [
//!     "feed",
//!     { name = "web-manifest", options = { theme_color = "#ffffff" } },
//! ]
//! ```
//!
//! Option tables are opaque at this layer. This module guarantees only that
//! the list order is preserved exactly as declared; decoding each table is
//! the pipeline's job (see [`pipeline`](crate::pipeline)).
//!
//! ## Partial Configuration
//!
//! User config is sparse — values merge over the stock defaults, which
//! reproduce the site's canonical wiring. Unknown keys in the `[site]`
//! tables are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file name looked up in the project root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// The full site configuration: metadata plus the ordered plugin list.
///
/// Immutable after load. Metadata and plugin list are independent — an
/// empty plugin list is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site metadata rendered into pages, the feed, and the web manifest.
    pub site: SiteMetadata,
    /// Ordered build-stage plugins. Order is preserved exactly as declared.
    pub plugins: Vec<PluginSpec>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteMetadata::default(),
            plugins: default_plugins(),
        }
    }
}

impl SiteConfig {
    /// Validate metadata values. Plugin option tables are validated later,
    /// during pipeline resolution.
    ///
    /// `social.github` is deliberately not checked: it is rendered verbatim
    /// as a link target, so a malformed value is a broken link, not a
    /// build failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation("site.title must not be empty".into()));
        }
        if self.site.author.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.author must not be empty".into(),
            ));
        }
        if !self.site.site_url.starts_with("http://") && !self.site.site_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "site.site_url must be an absolute http(s) URL".into(),
            ));
        }
        Ok(())
    }
}

/// Site metadata. Created once at configuration load, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
    /// Canonical absolute URL of the published site.
    pub site_url: String,
    pub social: SocialLinks,
}

impl Default for SiteMetadata {
    fn default() -> Self {
        Self {
            title: "Sublime Blog".to_string(),
            author: "Enerqi".to_string(),
            description: "Software, Programming, Tech".to_string(),
            site_url: "https://blog.sublime.is/".to_string(),
            social: SocialLinks::default(),
        }
    }
}

/// Social handles. `twitter` uses the sentinel `"none"` for "no account".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocialLinks {
    pub twitter: String,
    pub github: String,
}

impl SocialLinks {
    /// Whether a twitter handle is configured (the sentinel means no).
    pub fn has_twitter(&self) -> bool {
        self.twitter != "none" && !self.twitter.is_empty()
    }
}

impl Default for SocialLinks {
    fn default() -> Self {
        Self {
            twitter: "none".to_string(),
            github: "https://github.com/enerqi".to_string(),
        }
    }
}

/// A build-stage plugin selection: a bare identifier, or an identifier
/// paired with an opaque options table.
///
/// Any other shape fails to deserialize, including pairs with extra keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum PluginSpec {
    Bare(String),
    Configured {
        name: String,
        #[serde(default)]
        options: toml::Table,
    },
}

impl PluginSpec {
    /// The plugin identifier, regardless of shape.
    pub fn name(&self) -> &str {
        match self {
            PluginSpec::Bare(name) => name,
            PluginSpec::Configured { name, .. } => name,
        }
    }

    /// The options table — empty for bare entries.
    pub fn options(&self) -> toml::Table {
        match self {
            PluginSpec::Bare(_) => toml::Table::new(),
            PluginSpec::Configured { options, .. } => options.clone(),
        }
    }
}

/// The canonical plugin wiring for the site.
///
/// Order matters: sources register first, then the markdown transformer
/// with its nested plugins, then the image pipeline and output stages.
fn default_plugins() -> Vec<PluginSpec> {
    vec![
        configured(
            "source-filesystem",
            &[("path", val("content/blog")), ("name", val("blog"))],
        ),
        configured(
            "source-filesystem",
            &[("path", val("content/assets")), ("name", val("assets"))],
        ),
        configured(
            "transformer-markdown",
            &[(
                "plugins",
                toml::Value::Array(vec![
                    spec_value(&configured(
                        "markdown-images",
                        &[("max_width", toml::Value::Integer(590))],
                    )),
                    spec_value(&configured(
                        "markdown-responsive-iframe",
                        &[("wrapper_style", val("margin-bottom: 1.0725rem"))],
                    )),
                    val("markdown-highlight"),
                    val("markdown-copy-linked-files"),
                    val("markdown-smartypants"),
                ]),
            )],
        ),
        PluginSpec::Bare("image-pipeline".to_string()),
        PluginSpec::Bare("feed".to_string()),
        configured(
            "web-manifest",
            &[
                ("name", val("Sublime Blog")),
                ("short_name", val("Sublime Blog")),
                ("start_url", val("/")),
                ("background_color", val("#ffffff")),
                ("theme_color", val("#ffffff")),
                ("display", val("standalone")),
                ("legacy", toml::Value::Boolean(false)),
                ("icon", val("content/assets/quasar-square.jpg")),
            ],
        ),
        PluginSpec::Bare("offline".to_string()),
        configured(
            "typography",
            &[("omit_google_font", toml::Value::Boolean(true))],
        ),
    ]
}

fn val(s: &str) -> toml::Value {
    toml::Value::String(s.to_string())
}

fn configured(name: &str, options: &[(&str, toml::Value)]) -> PluginSpec {
    let mut table = toml::Table::new();
    for (key, value) in options {
        table.insert(key.to_string(), value.clone());
    }
    PluginSpec::Configured {
        name: name.to_string(),
        options: table,
    }
}

fn spec_value(spec: &PluginSpec) -> toml::Value {
    toml::Value::try_from(spec).expect("plugin spec must serialize")
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely. This
///   includes the plugin list: a user-declared list replaces the stock
///   list wholesale, preserving the user's ordering.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the project root.
///
/// Merges user values on top of stock defaults, rejects unknown metadata
/// keys, and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Sublime Blog Configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys under [site] will cause an error.

# ---------------------------------------------------------------------------
# Site metadata
# ---------------------------------------------------------------------------
[site]
title = "Sublime Blog"
author = "Enerqi"
description = "Software, Programming, Tech"

# Canonical absolute URL of the published site.
site_url = "https://blog.sublime.is/"

[site.social]
# "none" means no twitter account; anything else is treated as a handle.
twitter = "none"
github = "https://github.com/enerqi"

# ---------------------------------------------------------------------------
# Build pipeline
# ---------------------------------------------------------------------------
# Ordered list of build-stage plugins. Each entry is either a bare name or
# { name = "...", options = { ... } }. Declaring `plugins` replaces the
# stock list entirely.
plugins = [
    { name = "source-filesystem", options = { path = "content/blog", name = "blog" } },
    { name = "source-filesystem", options = { path = "content/assets", name = "assets" } },
    { name = "transformer-markdown", options = { plugins = [{ name = "markdown-images", options = { max_width = 590 } }, { name = "markdown-responsive-iframe", options = { wrapper_style = "margin-bottom: 1.0725rem" } }, "markdown-highlight", "markdown-copy-linked-files", "markdown-smartypants"] } },
    "image-pipeline",
    "feed",
    { name = "web-manifest", options = { name = "Sublime Blog", short_name = "Sublime Blog", start_url = "/", background_color = "#ffffff", theme_color = "#ffffff", display = "standalone", legacy = false, icon = "content/assets/quasar-square.jpg" } },
    "offline",
    { name = "typography", options = { omit_google_font = true } },
]
"##
}
