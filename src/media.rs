use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::fetcher;

/// Acceptance policy for downloaded imagery. The sites serve a generic
/// placeholder image for missing frames; its exact byte length is the only
/// reliable way to detect it, so the length is configuration, not a constant.
#[derive(Debug, Clone)]
pub struct MediaPolicy {
    pub min_bytes: u64,
    pub placeholder_bytes: Option<u64>,
    /// Candidate extensions tried in order for each frame.
    pub extensions: Vec<String>,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        MediaPolicy {
            min_bytes: 1024,
            placeholder_bytes: None,
            extensions: vec!["webp".into(), "png".into(), "jpg".into()],
        }
    }
}

impl MediaPolicy {
    pub fn accepts(&self, len: u64) -> bool {
        len >= self.min_bytes && Some(len) != self.placeholder_bytes
    }
}

/// Outcome of one frame slot, success or not.
#[derive(Debug)]
pub struct FrameReport {
    pub frame: u32,
    pub saved: Option<PathBuf>,
}

/// Downloads a numbered image set (a 360°-spin set, or the 4-angle fallback
/// set) into `dest`. For each frame the candidates are tried once each, in
/// extension order; the first acceptable response is written to
/// `<dest>/<frame>.webp`. Failed frames are reported and the batch goes on.
pub fn download_frames(
    client: &Client,
    base_url: &str,
    remote_dir: &str,
    frames: u32,
    dest: &Path,
    policy: &MediaPolicy,
) -> Result<Vec<FrameReport>> {
    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create media directory {}", dest.display()))?;

    let mut reports = Vec::with_capacity(frames as usize);
    for frame in 1..=frames {
        let mut saved = None;
        for ext in &policy.extensions {
            let url = format!("{base_url}{remote_dir}{frame}.{ext}");
            match fetcher::fetch_bytes(client, &url) {
                Ok(bytes) if policy.accepts(bytes.len() as u64) => {
                    let target = dest.join(format!("{frame}.webp"));
                    fs::write(&target, &bytes)
                        .with_context(|| format!("failed to write {}", target.display()))?;
                    debug!(frame, url = %url, bytes = bytes.len(), "frame saved");
                    saved = Some(target);
                    break;
                }
                Ok(bytes) => {
                    debug!(frame, url = %url, bytes = bytes.len(), "candidate rejected by policy");
                }
                Err(e) => {
                    debug!(frame, url = %url, error = %e, "candidate fetch failed");
                }
            }
        }
        if saved.is_none() {
            warn!(frame, "no acceptable candidate for frame");
        }
        reports.push(FrameReport { frame, saved });
    }

    let ok = reports.iter().filter(|r| r.saved.is_some()).count();
    info!(ok, total = frames, "frame download finished");
    Ok(reports)
}

/// Filenames in `dir` matching `<n>.webp`, sorted by the numeric suffix.
/// This rebuilds the gallery from what was actually downloaded, holes and
/// all; the first entry doubles as the primary image.
pub fn list_gallery(dir: &Path) -> Result<Vec<String>> {
    let pattern = Regex::new(r"^(\d+)\.webp$").unwrap();
    let mut frames: Vec<(u32, String)> = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to read media directory {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(caps) = pattern.captures(name) {
            if let Ok(number) = caps[1].parse::<u32>() {
                frames.push((number, name.to_string()));
            }
        }
    }

    frames.sort_by_key(|(number, _)| *number);
    Ok(frames.into_iter().map(|(_, name)| name).collect())
}

/// Public URLs for the listed gallery files, in the same order.
pub fn gallery_urls(public_base: &str, files: &[String]) -> Vec<String> {
    let base = public_base.trim_end_matches('/');
    files.iter().map(|f| format!("{base}/{f}")).collect()
}
