use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sublime_blog::{config, generate, process, scan};

/// Shared flags for commands that encode images.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the encode cache — force re-encoding of all renditions
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sublime-blog")]
#[command(about = "Static site generator for the Sublime personal blog")]
#[command(long_about = "\
Static site generator for the Sublime personal blog

Markdown posts in, fully static site out. The build pipeline is declared
in site.toml as an ordered plugin list; metadata, the feed, the web
manifest and the offline service worker all flow from that one file.

Project structure:

  .
  ├── site.toml                    # Site config (optional, defaults apply)
  └── content/
      ├── blog/                    # Posts
      │   ├── hello-world/
      │   │   ├── index.md         # ---\\n title/date/description \\n---
      │   │   └── figure.jpg       # referenced images get responsive sizes
      │   └── short-note.md
      └── assets/
          ├── profile-pic.jpg      # bio avatar (fixed 50x50)
          ├── github-mark.svg      # copied to the site root
          ├── quasar-square.jpg    # web manifest icon source
          └── fonts/               # self-hosted fonts

Run 'sublime-blog gen-config' to print a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root (contains site.toml and the content sources)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifests, processed images)
    #[arg(long, default_value = ".sublime-blog-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan content sources into a manifest
    Scan,
    /// Generate image renditions from the scan manifest
    Process(CacheArgs),
    /// Produce the final HTML site from the processed manifest
    Generate,
    /// Run the full pipeline: scan → process → generate
    Build(CacheArgs),
    /// Validate configuration and content without building
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan => {
            let manifest = scan::scan(&cli.source)?;
            std::fs::create_dir_all(&cli.temp_dir)?;
            let manifest_path = cli.temp_dir.join("manifest.json");
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&manifest_path, json)?;
            println!(
                "Scanned {} posts, {} assets → {}",
                manifest.posts.len(),
                manifest.assets.len(),
                manifest_path.display()
            );
        }
        Command::Process(cache_args) => {
            let scan_manifest_path = cli.temp_dir.join("manifest.json");
            let processed_dir = cli.temp_dir.join("processed");
            let result = process::process(
                &scan_manifest_path,
                &cli.source,
                &processed_dir,
                !cache_args.no_cache,
            )?;
            let json = serde_json::to_string_pretty(&result.manifest)?;
            std::fs::write(processed_dir.join("manifest.json"), json)?;
            println!("Cache: {}", result.cache_stats);
        }
        Command::Generate => {
            let processed_dir = cli.temp_dir.join("processed");
            generate::generate(
                &processed_dir.join("manifest.json"),
                &processed_dir,
                &cli.output,
                &cli.source,
                version_string(),
            )?;
        }
        Command::Build(cache_args) => {
            std::fs::create_dir_all(&cli.temp_dir)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            let scan_manifest_path = cli.temp_dir.join("manifest.json");
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&scan_manifest_path, json)?;
            println!(
                "    {} posts, {} assets",
                manifest.posts.len(),
                manifest.assets.len()
            );

            println!("==> Stage 2: Processing images");
            let processed_dir = cli.temp_dir.join("processed");
            let result = process::process(
                &scan_manifest_path,
                &cli.source,
                &processed_dir,
                !cache_args.no_cache,
            )?;
            let json = serde_json::to_string_pretty(&result.manifest)?;
            std::fs::write(processed_dir.join("manifest.json"), json)?;
            println!("    Cache: {}", result.cache_stats);

            println!("==> Stage 3: Generating HTML → {}", cli.output.display());
            generate::generate(
                &processed_dir.join("manifest.json"),
                &processed_dir,
                &cli.output,
                &cli.source,
                version_string(),
            )?;

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            println!(
                "    {} posts, {} assets, {} plugins",
                manifest.posts.len(),
                manifest.assets.len(),
                manifest.config.plugins.len()
            );
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
