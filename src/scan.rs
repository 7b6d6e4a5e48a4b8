//! Content discovery and manifest generation.
//!
//! Stage 1 of the build pipeline. Walks the content sources declared by the
//! plugin list and produces a structured manifest that subsequent stages
//! consume.
//!
//! ## Content Structure
//!
//! ```text
//! .
//! ├── site.toml                   # Site configuration (optional)
//! └── content/
//!     ├── blog/                   # "blog" source → posts
//!     │   ├── hello-world/
//!     │   │   ├── index.md        # front-matter + markdown body
//!     │   │   └── figure.jpg      # post-local image
//!     │   └── short-note.md       # flat post, slug = file stem
//!     └── assets/                 # any other source → assets
//!         ├── profile-pic.jpg
//!         ├── github-mark.svg
//!         └── quasar-square.jpg
//! ```
//!
//! ## Front-matter
//!
//! Posts open with an optional `---` block of `key: value` lines. `title`,
//! `date` (`YYYY-MM-DD`) and `description` are recognized; unknown keys are
//! ignored. A post's title falls back to its first `# ` heading, then to
//! the slug with dashes as spaces.
//!
//! ## Ordering
//!
//! Posts sort by date descending; undated posts sort last, by title. The
//! manifest carries the final order so later stages never re-sort.

use crate::config::{self, SiteConfig};
use crate::pipeline::{self, SourceOptions};
use crate::types::{Asset, Post};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Plugin resolution error: {0}")]
    Resolve(#[from] pipeline::ResolveError),
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("invalid front-matter line in {path}: {line:?}")]
    FrontMatter { path: PathBuf, line: String },
    #[error("invalid date {value:?} in {path} (expected YYYY-MM-DD)")]
    BadDate { path: PathBuf, value: String },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Manifest output from the scan stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Posts in final display order (newest first).
    pub posts: Vec<Post>,
    pub assets: Vec<Asset>,
    /// Configuration travels with the manifest so later stages resolve the
    /// same plan without re-reading `site.toml`.
    pub config: SiteConfig,
}

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    let config = config::load_config(root)?;
    let plan = pipeline::resolve(&config.plugins)?;

    let mut posts = Vec::new();
    let mut assets = Vec::new();

    // Sources scan in declaration order
    for source in &plan.sources {
        let dir = root.join(&source.path);
        if !dir.is_dir() {
            return Err(ScanError::SourceNotFound(dir));
        }
        if source.name == "blog" {
            posts.extend(scan_posts(&dir, root)?);
        } else {
            assets.extend(scan_assets(&dir, source)?);
        }
    }

    posts.sort_by(compare_posts);

    Ok(Manifest {
        posts,
        assets,
        config,
    })
}

/// Newest first; undated posts last, ordered by title.
fn compare_posts(a: &Post, b: &Post) -> Ordering {
    match (a.date, b.date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
}

fn scan_posts(dir: &Path, root: &Path) -> Result<Vec<Post>, ScanError> {
    let mut posts = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path
                .extension()
                .map(|e| !e.eq_ignore_ascii_case("md"))
                .unwrap_or(true)
        {
            continue;
        }
        posts.push(parse_post(path, dir, root)?);
    }

    Ok(posts)
}

fn parse_post(path: &Path, blog_dir: &Path, root: &Path) -> Result<Post, ScanError> {
    let content = fs::read_to_string(path)?;
    let (front_matter, body) = split_front_matter(&content);

    let mut title = None;
    let mut date = None;
    let mut description = None;

    if let Some(block) = front_matter {
        for line in block.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(ScanError::FrontMatter {
                    path: path.to_path_buf(),
                    line: line.to_string(),
                });
            };
            let value = value.trim();
            match key.trim() {
                "title" => title = Some(value.to_string()),
                "date" => {
                    date = Some(
                        chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                            ScanError::BadDate {
                                path: path.to_path_buf(),
                                value: value.to_string(),
                            }
                        })?,
                    )
                }
                "description" => description = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let slug = post_slug(path, blog_dir);

    // Title fallback chain: front-matter, first heading, slug
    let title = title
        .or_else(|| {
            body.lines()
                .find(|line| line.starts_with("# "))
                .map(|line| line.trim_start_matches("# ").trim().to_string())
        })
        .unwrap_or_else(|| slug.replace('-', " "));

    let source_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();

    Ok(Post {
        slug,
        title,
        date,
        description,
        body: body.to_string(),
        source_path,
    })
}

/// Split an optional leading `---` front-matter block from the body.
fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };
    for marker in ["\n---\n", "\n---\r\n", "\r\n---\r\n", "\r\n---\n"] {
        if let Some(pos) = rest.find(marker) {
            return (Some(&rest[..pos]), &rest[pos + marker.len()..]);
        }
    }
    // Unterminated block: treat the whole file as body
    (None, content)
}

/// `hello-world/index.md` → `hello-world`; `short-note.md` → `short-note`.
fn post_slug(path: &Path, blog_dir: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem == "index" {
        if let Some(parent) = path.parent().filter(|p| *p != blog_dir) {
            if let Some(name) = parent.file_name() {
                return name.to_string_lossy().to_string();
            }
        }
    }
    stem
}

fn scan_assets(dir: &Path, source: &SourceOptions) -> Result<Vec<Asset>, ScanError> {
    let mut assets = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if name.starts_with('.') {
            continue;
        }

        let rel_path = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        assets.push(Asset {
            path: absolute.to_string_lossy().to_string(),
            rel_path,
            source: source.name.clone(),
        });
    }

    Ok(assets)
}

/// Find an asset whose absolute path matches `pattern`.
///
/// This is the data-query mechanism components use to declare an asset
/// dependency (the bio avatar is looked up with `profile-pic\.jpg`).
/// Returns the first match in scan order.
pub fn find_asset<'a>(
    assets: &'a [Asset],
    pattern: &str,
) -> Result<Option<&'a Asset>, regex::Error> {
    let re = regex::Regex::new(pattern)?;
    Ok(assets.iter().find(|a| re.is_match(&a.path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Minimal content layout satisfying the stock source list.
    fn setup_content(tmp: &TempDir) {
        fs::create_dir_all(tmp.path().join("content/blog")).unwrap();
        fs::create_dir_all(tmp.path().join("content/assets")).unwrap();
    }

    fn write_post(tmp: &TempDir, rel: &str, content: &str) {
        let path = tmp.path().join("content/blog").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scan_empty_sources() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        let manifest = scan(tmp.path()).unwrap();
        assert!(manifest.posts.is_empty());
        assert!(manifest.assets.is_empty());
        assert_eq!(manifest.config.site.title, "Sublime Blog");
    }

    #[test]
    fn missing_source_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("content/blog")).unwrap();
        // content/assets missing
        let result = scan(tmp.path());
        assert!(matches!(result, Err(ScanError::SourceNotFound(_))));
    }

    #[test]
    fn post_front_matter_parsed() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(
            &tmp,
            "hello-world/index.md",
            "---\ntitle: Hello World\ndate: 2020-03-14\ndescription: The first post\n---\n\nBody text.\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.posts.len(), 1);
        let post = &manifest.posts[0];
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.title, "Hello World");
        assert_eq!(
            post.date,
            Some(chrono::NaiveDate::from_ymd_opt(2020, 3, 14).unwrap())
        );
        assert_eq!(post.description.as_deref(), Some("The first post"));
        assert_eq!(post.body.trim(), "Body text.");
        assert_eq!(post.source_path, "content/blog/hello-world/index.md");
    }

    #[test]
    fn flat_post_slug_from_stem() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "short-note.md", "Some note.\n");

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.posts[0].slug, "short-note");
    }

    #[test]
    fn title_falls_back_to_heading() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "notes.md", "# Notes From The Field\n\nContent.\n");

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.posts[0].title, "Notes From The Field");
    }

    #[test]
    fn title_falls_back_to_slug() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "fast-code-tricks.md", "No heading here.\n");

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.posts[0].title, "fast code tricks");
    }

    #[test]
    fn front_matter_value_may_contain_colons() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(
            &tmp,
            "colons.md",
            "---\ntitle: Rust: the good parts\n---\nBody.\n",
        );

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.posts[0].title, "Rust: the good parts");
    }

    #[test]
    fn malformed_front_matter_line_is_error() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "bad.md", "---\nthis line has no separator\n---\nBody.\n");

        let result = scan(tmp.path());
        assert!(matches!(result, Err(ScanError::FrontMatter { .. })));
    }

    #[test]
    fn bad_date_is_error() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "bad-date.md", "---\ndate: 14/03/2020\n---\nBody.\n");

        let result = scan(tmp.path());
        assert!(matches!(result, Err(ScanError::BadDate { .. })));
    }

    #[test]
    fn unknown_front_matter_keys_ignored() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "extra.md", "---\ntitle: Extra\nlayout: wide\n---\nBody.\n");

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.posts[0].title, "Extra");
    }

    #[test]
    fn unterminated_front_matter_treated_as_body() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "dashes.md", "---\nnot front matter really\n");

        let manifest = scan(tmp.path()).unwrap();
        assert!(manifest.posts[0].body.contains("not front matter"));
    }

    #[test]
    fn posts_sorted_newest_first_undated_last() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "older.md", "---\ntitle: Older\ndate: 2019-01-01\n---\n");
        write_post(&tmp, "newer.md", "---\ntitle: Newer\ndate: 2021-06-01\n---\n");
        write_post(&tmp, "undated-b.md", "---\ntitle: B undated\n---\n");
        write_post(&tmp, "undated-a.md", "---\ntitle: A undated\n---\n");

        let manifest = scan(tmp.path()).unwrap();
        let titles: Vec<&str> = manifest.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older", "A undated", "B undated"]);
    }

    #[test]
    fn non_markdown_files_in_blog_ignored_as_posts() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        write_post(&tmp, "post/index.md", "# Post\n");
        fs::write(tmp.path().join("content/blog/post/figure.jpg"), "fake").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert_eq!(manifest.posts.len(), 1);
    }

    #[test]
    fn assets_scanned_recursively() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        fs::write(tmp.path().join("content/assets/profile-pic.jpg"), "fake").unwrap();
        fs::create_dir_all(tmp.path().join("content/assets/fonts")).unwrap();
        fs::write(
            tmp.path().join("content/assets/fonts/merriweather-regular.woff2"),
            "fake",
        )
        .unwrap();

        let manifest = scan(tmp.path()).unwrap();
        let rels: Vec<&str> = manifest.assets.iter().map(|a| a.rel_path.as_str()).collect();
        assert!(rels.contains(&"profile-pic.jpg"));
        assert!(rels.iter().any(|r| r.ends_with("merriweather-regular.woff2")));
        assert!(manifest.assets.iter().all(|a| a.source == "assets"));
    }

    #[test]
    fn hidden_files_skipped() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        fs::write(tmp.path().join("content/assets/.DS_Store"), "junk").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert!(manifest.assets.is_empty());
    }

    #[test]
    fn find_asset_by_pattern() {
        let tmp = TempDir::new().unwrap();
        setup_content(&tmp);
        fs::write(tmp.path().join("content/assets/profile-pic.jpg"), "fake").unwrap();
        fs::write(tmp.path().join("content/assets/other.jpg"), "fake").unwrap();

        let manifest = scan(tmp.path()).unwrap();
        let found = find_asset(&manifest.assets, r"profile-pic\.jpg").unwrap();
        assert!(found.unwrap().rel_path.ends_with("profile-pic.jpg"));

        let missing = find_asset(&manifest.assets, r"banner\.png").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn find_asset_invalid_pattern_is_error() {
        assert!(find_asset(&[], "profile-pic(").is_err());
    }

    #[test]
    fn custom_source_list_respected() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("media")).unwrap();
        fs::write(tmp.path().join("media/logo.png"), "fake").unwrap();
        fs::write(
            tmp.path().join("site.toml"),
            r#"plugins = [{ name = "source-filesystem", options = { path = "media", name = "media" } }]"#,
        )
        .unwrap();

        let manifest = scan(tmp.path()).unwrap();
        assert!(manifest.posts.is_empty());
        assert_eq!(manifest.assets.len(), 1);
        assert_eq!(manifest.assets[0].source, "media");
    }
}
