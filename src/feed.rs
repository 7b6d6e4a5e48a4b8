//! RSS feed generation.
//!
//! Builds the `/rss.xml` channel from the site metadata and the post list.
//! Undated posts are skipped — a feed item without a publication date is
//! useless to readers and fails channel validation in some aggregators.

use crate::config::SiteMetadata;
use crate::types::Post;
use chrono::{NaiveTime, TimeZone, Utc};
use rss::validation::Validate;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use thiserror::Error;

/// Published path of the feed.
pub const FEED_PATH: &str = "rss.xml";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed validation failed: {0}")]
    Validation(#[from] rss::validation::ValidationError),
}

/// Generate the RSS XML for the site.
///
/// Posts arrive in display order (newest first) and keep that order in the
/// channel.
pub fn build_feed(site: &SiteMetadata, posts: &[Post]) -> Result<String, FeedError> {
    let items: Vec<rss::Item> = posts
        .iter()
        .filter_map(|post| post_to_item(site, post))
        .collect();

    let channel = ChannelBuilder::default()
        .title(&site.title)
        .link(&site.site_url)
        .description(&site.description)
        .generator(Some(concat!("sublime-blog ", env!("CARGO_PKG_VERSION")).to_string()))
        .items(items)
        .build();

    channel.validate()?;
    Ok(channel.to_string())
}

/// Convert a post into a feed item. Returns `None` for undated posts.
fn post_to_item(site: &SiteMetadata, post: &Post) -> Option<rss::Item> {
    let date = post.date?;
    let midnight = date.and_time(NaiveTime::MIN);
    let pub_date = Utc.from_utc_datetime(&midnight).to_rfc2822();
    let link = post_url(site, &post.slug);

    Some(
        ItemBuilder::default()
            .title(Some(post.title.clone()))
            .link(Some(link.clone()))
            .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
            .description(post.description.clone())
            .pub_date(Some(pub_date))
            .build(),
    )
}

/// Absolute URL of a post page.
pub fn post_url(site: &SiteMetadata, slug: &str) -> String {
    format!("{}/{}/", site.site_url.trim_end_matches('/'), slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteMetadata;
    use chrono::NaiveDate;

    fn post(slug: &str, title: &str, date: Option<NaiveDate>) -> Post {
        Post {
            slug: slug.to_string(),
            title: title.to_string(),
            date,
            description: Some(format!("About {}", title)),
            body: String::new(),
            source_path: format!("content/blog/{}.md", slug),
        }
    }

    #[test]
    fn channel_carries_site_metadata() {
        let site = SiteMetadata::default();
        let xml = build_feed(&site, &[]).unwrap();
        assert!(xml.contains("<title>Sublime Blog</title>"));
        assert!(xml.contains("<link>https://blog.sublime.is/</link>"));
        assert!(xml.contains("<description>Software, Programming, Tech</description>"));
    }

    #[test]
    fn items_have_permalink_guid_and_rfc2822_date() {
        let site = SiteMetadata::default();
        let posts = vec![post(
            "hello-world",
            "Hello World",
            NaiveDate::from_ymd_opt(2020, 3, 14),
        )];
        let xml = build_feed(&site, &posts).unwrap();

        assert!(xml.contains("<title>Hello World</title>"));
        assert!(xml.contains("https://blog.sublime.is/hello-world/"));
        assert!(xml.contains("Sat, 14 Mar 2020 00:00:00 +0000"));
        assert!(xml.contains("About Hello World"));
    }

    #[test]
    fn undated_posts_skipped() {
        let site = SiteMetadata::default();
        let posts = vec![
            post("dated", "Dated", NaiveDate::from_ymd_opt(2021, 1, 2)),
            post("draft", "Draft", None),
        ];
        let xml = build_feed(&site, &posts).unwrap();
        assert!(xml.contains("<title>Dated</title>"));
        assert!(!xml.contains("<title>Draft</title>"));
    }

    #[test]
    fn post_order_preserved() {
        let site = SiteMetadata::default();
        let posts = vec![
            post("newer", "Newer", NaiveDate::from_ymd_opt(2021, 6, 1)),
            post("older", "Older", NaiveDate::from_ymd_opt(2019, 1, 1)),
        ];
        let xml = build_feed(&site, &posts).unwrap();
        let newer_pos = xml.find("Newer").unwrap();
        let older_pos = xml.find("Older").unwrap();
        assert!(newer_pos < older_pos);
    }

    #[test]
    fn post_url_handles_trailing_slash() {
        let mut site = SiteMetadata::default();
        site.site_url = "https://blog.sublime.is".to_string();
        assert_eq!(
            post_url(&site, "hello-world"),
            "https://blog.sublime.is/hello-world/"
        );

        site.site_url = "https://blog.sublime.is/".to_string();
        assert_eq!(
            post_url(&site, "hello-world"),
            "https://blog.sublime.is/hello-world/"
        );
    }

    #[test]
    fn empty_feed_is_valid() {
        let site = SiteMetadata::default();
        let xml = build_feed(&site, &[]).unwrap();
        assert!(xml.contains("<rss"));
        assert!(!xml.contains("<item>"));
    }
}
