mod archiver;
mod config;
mod emitter;
mod fetcher;
mod linker;
mod media;
mod models;
mod parser;
mod sql;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::SeedConfig;
use crate::emitter::UuidSource;
use crate::media::MediaPolicy;
use crate::models::Family;

#[derive(Parser)]
#[command(name = "catseed")]
#[command(version, about = "Vehicle catalog scraping and SQL seed generation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a model page and reshape its embedded catalog block into a catalog JSON file
    Scrape {
        /// Page URL carrying the embedded state block
        #[arg(long)]
        url: String,

        /// Marker preceding the embedded JSON object in the script tag
        #[arg(long, default_value = "window.__MODEL_STATE__")]
        marker: String,

        /// Field name matched while searching the embedded tree
        #[arg(long, default_value = "modelCode")]
        match_key: String,

        /// Field value identifying the wanted model subtree
        #[arg(long)]
        match_value: String,

        /// Brand slug prefixed to every derived slug
        #[arg(long)]
        brand_slug: String,

        /// Output catalog JSON path
        #[arg(short, long, default_value = "catalog.json")]
        out: PathBuf,

        /// Keep the raw page next to the output for debugging
        #[arg(long)]
        keep_html: bool,
    },

    /// Emit hierarchy seed SQL from a curated catalog JSON file
    Seed {
        /// Catalog description produced by scrape (and hand-reviewed)
        #[arg(short, long, default_value = "catalog.json")]
        catalog: PathBuf,

        /// Seed configuration with brand/template ids and jurisdiction policy
        #[arg(long, default_value = "seed-config.json")]
        config: PathBuf,

        /// Output SQL path; prints to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Download a numbered image set (360 spin, or the 4-angle fallback)
    Media {
        /// Site origin, e.g. https://www.example.com
        #[arg(long)]
        base_url: String,

        /// Remote directory holding the numbered frames, with trailing slash
        #[arg(long)]
        remote_dir: String,

        /// Number of spin frames to attempt
        #[arg(long, default_value_t = 40)]
        frames: u32,

        /// Download the 4-angle fallback set instead of a spin set
        #[arg(long)]
        angles: bool,

        /// Local target directory
        #[arg(short, long)]
        dest: PathBuf,

        /// Smallest acceptable response body, in bytes
        #[arg(long, default_value_t = 1024)]
        min_bytes: u64,

        /// Exact byte length of the site's placeholder image, rejected outright
        #[arg(long)]
        placeholder_bytes: Option<u64>,
    },

    /// Emit SQL linking catalog rows to an already-downloaded gallery
    Link {
        /// Local directory with the numbered frames
        #[arg(long)]
        media_dir: PathBuf,

        /// Public URL prefix the database rows should carry
        #[arg(long)]
        public_base: String,

        /// SKU row receiving the gallery
        #[arg(long)]
        sku_id: String,

        /// COLOR_DEF row mirrored with the same asset rows
        #[arg(long)]
        color_def_id: Option<String>,

        /// Output SQL path; prints to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catseed=info".into()),
        )
        .init();

    match Cli::parse().command {
        Commands::Scrape {
            url,
            marker,
            match_key,
            match_value,
            brand_slug,
            out,
            keep_html,
        } => run_scrape(&url, &marker, &match_key, &match_value, &brand_slug, &out, keep_html),
        Commands::Seed { catalog, config, out } => run_seed(&catalog, &config, out.as_deref()),
        Commands::Media {
            base_url,
            remote_dir,
            frames,
            angles,
            dest,
            min_bytes,
            placeholder_bytes,
        } => run_media(&base_url, &remote_dir, frames, angles, &dest, min_bytes, placeholder_bytes),
        Commands::Link {
            media_dir,
            public_base,
            sku_id,
            color_def_id,
            out,
        } => run_link(&media_dir, &public_base, &sku_id, color_def_id.as_deref(), out.as_deref()),
    }
}

fn run_scrape(
    url: &str,
    marker: &str,
    match_key: &str,
    match_value: &str,
    brand_slug: &str,
    out: &std::path::Path,
    keep_html: bool,
) -> Result<()> {
    let client = fetcher::build_client()?;
    let html = fetcher::fetch_html(&client, url)?;

    if keep_html {
        let dump = out.with_extension("html");
        std::fs::write(&dump, &html)
            .with_context(|| format!("failed to write {}", dump.display()))?;
    }

    let tree = parser::extract_embedded_json(&html, marker)?;
    let node = parser::find_node(&tree, match_key, match_value).with_context(|| {
        format!("no subtree with {match_key} = {match_value:?} in the embedded block")
    })?;
    let family = parser::catalog_from_tree(node, brand_slug)?;

    let color_count: usize = family.variants.iter().map(|v| v.skus.len()).sum();
    info!(
        family = %family.name,
        variants = family.variants.len(),
        colors = color_count,
        "catalog extracted"
    );
    archiver::write_json(&family, out)?;
    println!("Catalog written to {}.", out.display());
    Ok(())
}

fn run_seed(
    catalog: &std::path::Path,
    config: &std::path::Path,
    out: Option<&std::path::Path>,
) -> Result<()> {
    // brand/template problems abort here, before any output exists
    let config = SeedConfig::load(config)?;

    let raw = std::fs::read_to_string(catalog)
        .with_context(|| format!("failed to read catalog file {}", catalog.display()))?;
    let family: Family = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse catalog file {}", catalog.display()))?;

    let statements = emitter::emit_family(&family, &config, &mut UuidSource);
    archiver::write_statements(&statements, out)?;

    if let Some(path) = out {
        println!("Seed SQL written to {}.", path.display());
    }
    Ok(())
}

fn run_media(
    base_url: &str,
    remote_dir: &str,
    frames: u32,
    angles: bool,
    dest: &std::path::Path,
    min_bytes: u64,
    placeholder_bytes: Option<u64>,
) -> Result<()> {
    let policy = MediaPolicy {
        min_bytes,
        placeholder_bytes,
        ..MediaPolicy::default()
    };
    let frames = if angles { 4 } else { frames };

    let client = fetcher::build_client()?;
    let reports = media::download_frames(&client, base_url, remote_dir, frames, dest, &policy)?;

    let failed: Vec<u32> = reports
        .iter()
        .filter(|r| r.saved.is_none())
        .map(|r| r.frame)
        .collect();
    let ok = reports.len() - failed.len();
    println!("Downloaded {ok}/{frames} frames into {}.", dest.display());
    if !failed.is_empty() {
        println!("Missing frames: {failed:?}");
    }
    if ok == 0 {
        anyhow::bail!("no frame produced an acceptable response");
    }
    Ok(())
}

fn run_link(
    media_dir: &std::path::Path,
    public_base: &str,
    sku_id: &str,
    color_def_id: Option<&str>,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let files = media::list_gallery(media_dir)?;
    if files.is_empty() {
        anyhow::bail!("no numbered frames found in {}", media_dir.display());
    }

    let urls = media::gallery_urls(public_base, &files);
    let statements = linker::emit_asset_links(sku_id, color_def_id, &urls);
    archiver::write_statements(&statements, out)?;

    if let Some(path) = out {
        println!("Asset-link SQL written to {}.", path.display());
    }
    Ok(())
}
