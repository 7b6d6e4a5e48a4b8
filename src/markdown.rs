//! Markdown transformation.
//!
//! Converts post bodies to HTML through `pulldown-cmark`, rewriting the
//! event stream on the way according to the resolved
//! [`MarkdownOptions`](crate::pipeline::MarkdownOptions):
//!
//! - **Images**: relative image references whose renditions exist in the
//!   processed manifest are replaced with responsive markup (`srcset` +
//!   `sizes`, lazy loading) constrained to the configured max width.
//! - **Linked files**: relative links (and images without renditions, like
//!   GIFs) are recorded for copying into the output tree and their URLs
//!   rewritten to the published location.
//! - **Iframes**: raw iframe blocks are wrapped in a styled container so
//!   embeds keep the page's vertical rhythm.
//! - **Code fences**: fenced blocks get `language-*` classes for styling.
//! - **Smart punctuation**: straight quotes and dashes become typographic
//!   ones.
//!
//! The transform is pure with respect to the filesystem — file copying is
//! deferred to the generate stage via the returned [`LinkedFile`] list.

use crate::pipeline::MarkdownOptions;
use crate::types::FluidImage;
use maud::html;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::BTreeMap;

/// A file referenced from a post that must be copied into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedFile {
    /// Reference as written in the markdown, normalized (no leading `./`),
    /// relative to the post's directory.
    pub ref_path: String,
    /// Published URL the reference was rewritten to.
    pub url: String,
}

/// Result of transforming one post body.
#[derive(Debug)]
pub struct TransformOutput {
    pub html: String,
    pub linked_files: Vec<LinkedFile>,
}

/// Transform a post body to HTML.
///
/// `images` maps normalized relative references to the renditions the
/// process stage generated for this post.
pub fn transform(
    body: &str,
    slug: &str,
    options: &MarkdownOptions,
    images: &BTreeMap<String, FluidImage>,
) -> TransformOutput {
    let parser = Parser::new_ext(body, parser_options(options));
    let mut events: Vec<Event> = Vec::new();
    let mut linked_files = Vec::new();
    let mut in_fenced_block = false;

    let mut iter = parser.into_iter();
    while let Some(event) = iter.next() {
        match event {
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                // Alt text is the image's inner event stream
                let mut alt = String::new();
                for inner in iter.by_ref() {
                    match inner {
                        Event::End(TagEnd::Image) => break,
                        Event::Text(text) | Event::Code(text) => alt.push_str(&text),
                        _ => {}
                    }
                }

                let reference = normalize_ref(&dest_url);
                if let Some(fluid) = images.get(&reference) {
                    events.push(Event::Html(fluid_markup(fluid, &alt).into()));
                } else if options.copy_linked_files && is_relative_ref(&dest_url) {
                    let url = published_file_url(slug, &reference);
                    let markup = html! { img src=(url) alt=(alt); }.into_string();
                    linked_files.push(LinkedFile {
                        ref_path: reference,
                        url,
                    });
                    events.push(Event::Html(markup.into()));
                } else {
                    // External or unprocessed reference: pass through untouched
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                    events.push(Event::Text(CowStr::from(alt)));
                    events.push(Event::End(TagEnd::Image));
                }
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                if options.copy_linked_files && is_copyable_link(&dest_url) {
                    let reference = normalize_ref(&dest_url);
                    let url = published_file_url(slug, &reference);
                    linked_files.push(LinkedFile {
                        ref_path: reference,
                        url: url.clone(),
                    });
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url: CowStr::from(url),
                        title,
                        id,
                    }));
                } else {
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) if options.highlight => {
                let language = info.split_whitespace().next().unwrap_or("");
                let class = if language.is_empty() {
                    "language-text".to_string()
                } else {
                    format!("language-{}", language)
                };
                in_fenced_block = true;
                events.push(Event::Html(
                    format!("<pre class=\"{0}\"><code class=\"{0}\">", class).into(),
                ));
            }
            Event::End(TagEnd::CodeBlock) if in_fenced_block => {
                in_fenced_block = false;
                events.push(Event::Html("</code></pre>\n".into()));
            }
            Event::Html(raw) if is_iframe_block(&raw) => {
                if let Some(iframe) = &options.iframe {
                    events.push(Event::Html(
                        format!("<div class=\"iframe-wrapper\" style=\"{}\">", iframe.wrapper_style)
                            .into(),
                    ));
                    events.push(Event::Html(raw));
                    events.push(Event::Html("</div>".into()));
                } else {
                    events.push(Event::Html(raw));
                }
            }
            other => events.push(other),
        }
    }

    let mut out = String::new();
    md_html::push_html(&mut out, events.into_iter());

    TransformOutput {
        html: out,
        linked_files,
    }
}

/// Relative image references a post body makes, normalized.
///
/// The process stage uses this to know which sources need renditions
/// before the bodies are ever transformed.
pub fn collect_image_refs(body: &str) -> Vec<String> {
    let parser = Parser::new_ext(body, Options::empty());
    let mut refs = Vec::new();
    for event in parser {
        if let Event::Start(Tag::Image { dest_url, .. }) = event
            && is_relative_ref(&dest_url)
        {
            let reference = normalize_ref(&dest_url);
            if !refs.contains(&reference) {
                refs.push(reference);
            }
        }
    }
    refs
}

fn parser_options(options: &MarkdownOptions) -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    if options.smartypants {
        opts.insert(Options::ENABLE_SMART_PUNCTUATION);
    }
    opts
}

fn fluid_markup(fluid: &FluidImage, alt: &str) -> String {
    let wrapper_style = format!("display:block;max-width:{}px;margin:0 auto", fluid.width);
    html! {
        span.fluid-image style=(wrapper_style) {
            img src=(fluid.src)
                srcset=(fluid.srcset)
                sizes=(fluid.sizes)
                width=(fluid.width)
                height=(fluid.height)
                alt=(alt)
                loading="lazy"
                style="width:100%;height:auto";
        }
    }
    .into_string()
}

/// Whether a reference points into the post's own directory tree.
fn is_relative_ref(dest: &str) -> bool {
    !dest.starts_with("http://")
        && !dest.starts_with("https://")
        && !dest.starts_with("//")
        && !dest.starts_with('/')
        && !dest.starts_with('#')
        && !dest.starts_with("mailto:")
        && !dest.starts_with("data:")
}

/// Relative links to non-page files get copied and rewritten. Markdown
/// links stay untouched — they address other posts, not files.
fn is_copyable_link(dest: &str) -> bool {
    if !is_relative_ref(dest) {
        return false;
    }
    match dest.rsplit_once('.') {
        Some((_, ext)) => !ext.eq_ignore_ascii_case("md") && !ext.contains('/'),
        None => false,
    }
}

fn is_iframe_block(raw: &str) -> bool {
    raw.trim_start().starts_with("<iframe")
}

fn normalize_ref(dest: &str) -> String {
    dest.strip_prefix("./").unwrap_or(dest).to_string()
}

/// Published URL for a copied file: `/files/{slug}/{filename}`.
fn published_file_url(slug: &str, reference: &str) -> String {
    let filename = reference.rsplit('/').next().unwrap_or(reference);
    format!("/files/{}/{}", slug, filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{IframeOptions, ImagesOptions};

    fn full_options() -> MarkdownOptions {
        MarkdownOptions {
            images: Some(ImagesOptions::default()),
            iframe: Some(IframeOptions::default()),
            highlight: true,
            copy_linked_files: true,
            smartypants: true,
        }
    }

    fn sample_fluid() -> FluidImage {
        FluidImage {
            width: 590,
            height: 394,
            src: "/images/post/figure-590.jpg".to_string(),
            srcset: "/images/post/figure-295.jpg 295w, /images/post/figure-590.jpg 590w"
                .to_string(),
            sizes: "(max-width: 590px) 100vw, 590px".to_string(),
        }
    }

    #[test]
    fn plain_markdown_renders() {
        let out = transform("Some **bold** text.", "post", &full_options(), &BTreeMap::new());
        assert!(out.html.contains("<strong>bold</strong>"));
        assert!(out.linked_files.is_empty());
    }

    #[test]
    fn smart_punctuation_applied() {
        let out = transform(
            "\"Fast code\" -- always.",
            "post",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out.html.contains("\u{201c}Fast code\u{201d}"));
        assert!(out.html.contains("\u{2013}"));
    }

    #[test]
    fn smart_punctuation_off_without_plugin() {
        let options = MarkdownOptions {
            smartypants: false,
            ..full_options()
        };
        let out = transform("\"Fast code\"", "post", &options, &BTreeMap::new());
        assert!(out.html.contains("&quot;Fast code&quot;"));
    }

    #[test]
    fn processed_image_replaced_with_responsive_markup() {
        let mut images = BTreeMap::new();
        images.insert("figure.jpg".to_string(), sample_fluid());

        let out = transform("![A figure](./figure.jpg)", "post", &full_options(), &images);
        assert!(out.html.contains("srcset="));
        assert!(out.html.contains("sizes=\"(max-width: 590px) 100vw, 590px\""));
        assert!(out.html.contains("alt=\"A figure\""));
        assert!(out.html.contains("loading=\"lazy\""));
        assert!(out.html.contains("max-width:590px"));
        // The raw reference must be gone
        assert!(!out.html.contains("./figure.jpg"));
    }

    #[test]
    fn image_reference_without_dot_slash_matches() {
        let mut images = BTreeMap::new();
        images.insert("figure.jpg".to_string(), sample_fluid());

        let out = transform("![fig](figure.jpg)", "post", &full_options(), &images);
        assert!(out.html.contains("srcset="));
    }

    #[test]
    fn external_image_passes_through() {
        let out = transform(
            "![badge](https://example.com/badge.svg)",
            "post",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out.html.contains("https://example.com/badge.svg"));
        assert!(out.linked_files.is_empty());
    }

    #[test]
    fn unprocessed_relative_image_copied() {
        // A GIF gets no renditions; copy-linked-files picks it up
        let out = transform("![anim](./loop.gif)", "post", &full_options(), &BTreeMap::new());
        assert!(out.html.contains("src=\"/files/post/loop.gif\""));
        assert_eq!(
            out.linked_files,
            vec![LinkedFile {
                ref_path: "loop.gif".to_string(),
                url: "/files/post/loop.gif".to_string(),
            }]
        );
    }

    #[test]
    fn relative_file_link_rewritten_and_recorded() {
        let out = transform(
            "Download the [slides](talk.pdf).",
            "rustfest",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out.html.contains("href=\"/files/rustfest/talk.pdf\""));
        assert_eq!(out.linked_files[0].ref_path, "talk.pdf");
    }

    #[test]
    fn markdown_links_not_copied() {
        let out = transform(
            "See [another post](../other-post/index.md).",
            "post",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out.linked_files.is_empty());
        assert!(out.html.contains("../other-post/index.md"));
    }

    #[test]
    fn absolute_and_anchor_links_untouched() {
        let out = transform(
            "[site](https://blog.sublime.is/) and [top](#top) and [home](/)",
            "post",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out.linked_files.is_empty());
        assert!(out.html.contains("https://blog.sublime.is/"));
        assert!(out.html.contains("#top"));
    }

    #[test]
    fn fenced_code_gets_language_class() {
        let out = transform(
            "```rust\nfn main() {}\n```\n",
            "post",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out.html.contains("<pre class=\"language-rust\">"));
        assert!(out.html.contains("<code class=\"language-rust\">"));
        assert!(out.html.contains("fn main()"));
    }

    #[test]
    fn fenced_code_without_language_gets_text_class() {
        let out = transform("```\nplain\n```\n", "post", &full_options(), &BTreeMap::new());
        assert!(out.html.contains("language-text"));
    }

    #[test]
    fn code_content_still_escaped() {
        let out = transform(
            "```html\n<script>alert(1)</script>\n```\n",
            "post",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out.html.contains("&lt;script&gt;"));
        assert!(!out.html.contains("<script>alert"));
    }

    #[test]
    fn highlight_off_leaves_default_rendering() {
        let options = MarkdownOptions {
            highlight: false,
            ..full_options()
        };
        let out = transform("```rust\nlet x = 1;\n```\n", "post", &options, &BTreeMap::new());
        assert!(!out.html.contains("<pre class=\"language-rust\">"));
        assert!(out.html.contains("let x = 1;"));
    }

    #[test]
    fn iframe_wrapped_with_style() {
        let out = transform(
            "<iframe src=\"https://www.youtube.com/embed/x\"></iframe>\n",
            "post",
            &full_options(),
            &BTreeMap::new(),
        );
        assert!(out
            .html
            .contains("<div class=\"iframe-wrapper\" style=\"margin-bottom: 1.0725rem\">"));
        assert!(out.html.contains("</div>"));
    }

    #[test]
    fn iframe_unwrapped_without_plugin() {
        let options = MarkdownOptions {
            iframe: None,
            ..full_options()
        };
        let out = transform(
            "<iframe src=\"https://example.com\"></iframe>\n",
            "post",
            &options,
            &BTreeMap::new(),
        );
        assert!(!out.html.contains("iframe-wrapper"));
        assert!(out.html.contains("<iframe"));
    }

    #[test]
    fn transform_is_deterministic() {
        let mut images = BTreeMap::new();
        images.insert("figure.jpg".to_string(), sample_fluid());
        let body = "![fig](figure.jpg)\n\nSome `code` and \"quotes\".";
        let first = transform(body, "post", &full_options(), &images);
        let second = transform(body, "post", &full_options(), &images);
        assert_eq!(first.html, second.html);
    }

    // =========================================================================
    // collect_image_refs tests
    // =========================================================================

    #[test]
    fn collects_relative_refs_normalized() {
        let refs = collect_image_refs("![a](./one.jpg) and ![b](two.png)");
        assert_eq!(refs, vec!["one.jpg".to_string(), "two.png".to_string()]);
    }

    #[test]
    fn skips_external_and_absolute_refs() {
        let refs = collect_image_refs("![a](https://x.com/a.jpg) ![b](/static/b.jpg)");
        assert!(refs.is_empty());
    }

    #[test]
    fn deduplicates_refs() {
        let refs = collect_image_refs("![a](fig.jpg) again ![a](./fig.jpg)");
        assert_eq!(refs.len(), 1);
    }
}
