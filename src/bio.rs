//! Author bio block.
//!
//! A fixed presentational unit rendered onto the index page and under each
//! post: a circular avatar linking home, a short biography paragraph, and a
//! GitHub mark linking to the author's profile.
//!
//! The component itself is a pure function over [`BioData`]. Its data
//! dependency — the avatar rendition and the author/social metadata — is
//! resolved by the pipeline before rendering ever happens: the avatar asset
//! is looked up by [`AVATAR_PATTERN`] during the scan, encoded at exactly
//! [`AVATAR_WIDTH`]×[`AVATAR_HEIGHT`] during processing, and handed in here
//! as an explicit parameter. There is no fetch, no loading state, and no
//! error state at render time.

use crate::config::SocialLinks;
use crate::typography::Typography;
use crate::types::FixedImage;
use maud::{html, Markup};

/// Path pattern matching the avatar asset among scanned assets.
pub const AVATAR_PATTERN: &str = r"profile-pic\.jpg";

/// The avatar is always requested at exactly this size, regardless of the
/// source image's resolution. Cropping and scaling are the image
/// pipeline's job.
pub const AVATAR_WIDTH: u32 = 50;
pub const AVATAR_HEIGHT: u32 = 50;

/// Published URL of the GitHub mark icon (copied from the assets source).
pub const GITHUB_MARK_SRC: &str = "/github-mark.svg";

const BIO_TEXT: &str = "Notes from a software engineer with two decades working in various \
industries - games, poker and gambling, music streaming and telecommunications. \
Likes fast code and functional programming. Based in the UK.";

/// The bio component's resolved data dependency.
///
/// Constructed once per build from the processed manifest; the component
/// never reaches outside this value.
#[derive(Debug, Clone)]
pub struct BioData {
    pub avatar: FixedImage,
    pub author: String,
    pub social: SocialLinks,
}

/// Render the bio block.
///
/// Pure: identical input produces byte-identical markup. The GitHub link
/// target is rendered verbatim from `social.github`; a twitter link only
/// appears when the handle is not the `"none"` sentinel.
pub fn render_bio(data: &BioData, typography: &Typography) -> Markup {
    let container_style = format!("display:flex;margin-bottom:{}", typography.rhythm(2.5));
    let avatar_style = format!(
        "margin-right:{};margin-bottom:0;min-width:{}px;border-radius:100%",
        typography.rhythm(0.5),
        data.avatar.width,
    );

    html! {
        div.bio style=(container_style) {
            a href="/" {
                img.bio-avatar
                    src=(data.avatar.src)
                    srcset=(data.avatar.srcset)
                    width=(data.avatar.width)
                    height=(data.avatar.height)
                    alt=(data.author)
                    style=(avatar_style);
            }
            p.bio-text { (BIO_TEXT) }
            a.bio-github href=(data.social.github) {
                img src=(GITHUB_MARK_SRC) alt="github mark";
            }
            @if data.social.has_twitter() {
                a.bio-twitter href={ "https://twitter.com/" (data.social.twitter) } {
                    "Twitter"
                }
            }
        }
    }
}
