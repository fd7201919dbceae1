use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use uuid::Uuid;

/// Fixed identifiers and jurisdiction policy for one seed run. Loaded from a
/// JSON file next to the catalog data; an invalid brand or template id aborts
/// the run before any output is produced.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub brand_id: String,
    pub template_id: String,
    #[serde(default = "default_state_code")]
    pub state_code: String,
    #[serde(default = "default_district")]
    pub district: String,
    #[serde(default = "default_gst_rate")]
    pub gst_rate: u32,
    #[serde(default = "default_hsn_code")]
    pub hsn_code: String,
    /// Flat amount subtracted from the variant price for the jurisdiction
    /// price row.
    #[serde(default = "default_discount")]
    pub discount: i64,
}

fn default_state_code() -> String {
    "MH".into()
}

fn default_district() -> String {
    "ALL".into()
}

fn default_gst_rate() -> u32 {
    18
}

fn default_hsn_code() -> String {
    "87112019".into()
}

fn default_discount() -> i64 {
    1
}

impl SeedConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: SeedConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Uuid::parse_str(&self.brand_id)
            .with_context(|| format!("brand_id {:?} is not a valid UUID", self.brand_id))?;
        Uuid::parse_str(&self.template_id)
            .with_context(|| format!("template_id {:?} is not a valid UUID", self.template_id))?;
        if self.state_code.trim().is_empty() {
            anyhow::bail!("state_code must not be empty");
        }
        Ok(())
    }
}
