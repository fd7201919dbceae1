use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::redirect;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Client shared by the page fetch and the media downloads. The catalog
/// sites bounce through tracking redirects, so the chain is capped rather
/// than disabled.
pub fn build_client() -> Result<Client> {
    let redirect_policy = redirect::Policy::custom(|attempt| {
        if attempt.previous().len() > 10 {
            attempt.error("Too many redirects (>10)")
        } else {
            attempt.follow()
        }
    });

    Client::builder()
        .redirect(redirect_policy)
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")
}

pub fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request to {url} failed"))?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("{url} returned HTTP {status}");
    }
    resp.text().with_context(|| format!("failed to read body of {url}"))
}

pub fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request to {url} failed"))?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("{url} returned HTTP {status}");
    }
    Ok(resp
        .bytes()
        .with_context(|| format!("failed to read body of {url}"))?
        .to_vec())
}
