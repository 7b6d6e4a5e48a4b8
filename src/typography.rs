//! Vertical rhythm and site CSS.
//!
//! All spacing in the generated markup derives from a single rhythm unit:
//! one unit is the base line height expressed in rem. Margins, the bio
//! block's spacing, and the block-element stylesheet all go through
//! [`Typography::rhythm`] so the page keeps a consistent vertical grid.
//!
//! Fonts are self-hosted: when `omit_google_font` is set (the default),
//! the stylesheet declares `@font-face` rules pointing at `/fonts/` and no
//! external font link is ever emitted.

use crate::pipeline::TypographyOptions;

/// Rhythm calculator built from the resolved typography options.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    base_font_size: f64,
    base_line_height: f64,
    omit_google_font: bool,
}

impl Typography {
    pub fn new(options: &TypographyOptions) -> Self {
        Self {
            base_font_size: options.base_font_size,
            base_line_height: options.base_line_height,
            omit_google_font: options.omit_google_font,
        }
    }

    /// Convert a rhythm multiplier into a CSS length.
    ///
    /// One unit equals the base line height in rem:
    /// `rhythm(1.0)` → `"1.75rem"`, `rhythm(0.5)` → `"0.875rem"`.
    pub fn rhythm(&self, units: f64) -> String {
        format!("{}rem", format_number(units * self.base_line_height))
    }

    /// Whether external font links are suppressed in favor of `@font-face`.
    pub fn omit_google_font(&self) -> bool {
        self.omit_google_font
    }

    /// Generate the site stylesheet: root sizing, vertical rhythm margins,
    /// and self-hosted font declarations.
    pub fn stylesheet(&self) -> String {
        let font_size_percent = format_number(self.base_font_size / 16.0 * 100.0);
        let line_height = format_number(self.base_line_height);
        let block_margin = self.rhythm(1.0);
        let heading_margin_top = self.rhythm(1.5);

        let mut css = format!(
            r#"html {{
    font-size: {font_size_percent}%;
    line-height: {line_height};
}}

body {{
    font-family: Merriweather, Georgia, serif;
    color: var(--color-text, #111111);
}}

p, ul, ol, blockquote, table, figure, pre {{
    margin: 0 0 {block_margin} 0;
}}

h1, h2, h3, h4, h5, h6 {{
    font-family: Montserrat, sans-serif;
    margin: {heading_margin_top} 0 {block_margin} 0;
    line-height: 1.1;
}}
"#
        );

        if self.omit_google_font {
            css.push('\n');
            css.push_str(SELF_HOSTED_FONTS_CSS);
        }

        css
    }
}

impl Default for Typography {
    fn default() -> Self {
        Self::new(&TypographyOptions::default())
    }
}

/// `@font-face` rules for the self-hosted fonts copied from the assets
/// source. Browsers fall back to the stack in `body`/`h*` when the files
/// are absent, so a site without font assets still renders.
const SELF_HOSTED_FONTS_CSS: &str = r#"@font-face {
    font-family: "Merriweather";
    font-style: normal;
    font-weight: 400;
    font-display: swap;
    src: url("/fonts/merriweather-regular.woff2") format("woff2");
}

@font-face {
    font-family: "Montserrat";
    font-style: normal;
    font-weight: 700;
    font-display: swap;
    src: url("/fonts/montserrat-bold.woff2") format("woff2");
}
"#;

/// Format a number without trailing zeros: `4.375` → `"4.375"`, `1.0` → `"1"`.
fn format_number(value: f64) -> String {
    let mut s = format!("{value:.5}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
