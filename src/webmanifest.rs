//! Web app manifest generation.
//!
//! Emits `site.webmanifest` from the resolved `web-manifest` plugin
//! options. The icon set is fixed at 192 and 512 PNG — the two sizes the
//! install prompt and splash screen actually use. With `legacy = false`
//! (the default) no apple-touch-icon links appear in page heads; browsers
//! take icons from the manifest alone, which keeps every page a few
//! requests lighter.

use crate::pipeline::ManifestOptions;
use serde::Serialize;

/// Generated icon sizes, also consumed by the process stage.
pub const ICON_SIZES: &[u32] = &[192, 512];

/// Published manifest filename.
pub const MANIFEST_PATH: &str = "site.webmanifest";

/// The manifest document, serialized as the W3C web-app-manifest JSON.
#[derive(Debug, Serialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub start_url: String,
    pub background_color: String,
    pub theme_color: String,
    pub display: String,
    pub icons: Vec<ManifestIcon>,
}

#[derive(Debug, Serialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl WebManifest {
    pub fn from_options(options: &ManifestOptions) -> Self {
        Self {
            name: options.name.clone(),
            short_name: options.short_name.clone(),
            start_url: options.start_url.clone(),
            background_color: options.background_color.clone(),
            theme_color: options.theme_color.clone(),
            display: options.display.clone(),
            icons: ICON_SIZES
                .iter()
                .map(|size| ManifestIcon {
                    src: format!("/icon-{}.png", size),
                    sizes: format!("{0}x{0}", size),
                    mime_type: "image/png".to_string(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("manifest must serialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_manifest_values() {
        let manifest = WebManifest::from_options(&ManifestOptions::default());
        let json = manifest.to_json();

        assert!(json.contains(r#""name": "Sublime Blog""#));
        assert!(json.contains(r#""short_name": "Sublime Blog""#));
        assert!(json.contains(r#""start_url": "/""#));
        assert!(json.contains(r#""background_color": "#ffffff""#));
        assert!(json.contains(r#""theme_color": "#ffffff""#));
        assert!(json.contains(r#""display": "standalone""#));
    }

    #[test]
    fn manifest_declares_both_icons() {
        let manifest = WebManifest::from_options(&ManifestOptions::default());
        let json = manifest.to_json();

        assert!(json.contains(r#""src": "/icon-192.png""#));
        assert!(json.contains(r#""sizes": "192x192""#));
        assert!(json.contains(r#""src": "/icon-512.png""#));
        assert!(json.contains(r#""sizes": "512x512""#));
        assert!(json.contains(r#""type": "image/png""#));
    }

    #[test]
    fn manifest_json_parses_back() {
        let manifest = WebManifest::from_options(&ManifestOptions::default());
        let value: serde_json::Value = serde_json::from_str(&manifest.to_json()).unwrap();
        assert_eq!(value["icons"].as_array().unwrap().len(), 2);
        assert_eq!(value["display"], "standalone");
    }

    #[test]
    fn custom_options_flow_through() {
        let options = ManifestOptions {
            name: "Another Blog".to_string(),
            theme_color: "#222222".to_string(),
            ..ManifestOptions::default()
        };
        let json = WebManifest::from_options(&options).to_json();
        assert!(json.contains("Another Blog"));
        assert!(json.contains("#222222"));
    }
}
