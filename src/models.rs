use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One product line, as described by a curated catalog JSON file. The specs
/// mappings are open: they pass through to the database verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub specs: Map<String, Value>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub specs: Map<String, Value>,
    /// Color options under this variant; each one becomes a COLOR_DEF row
    /// plus its purchasable SKU.
    #[serde(default)]
    pub skus: Vec<ColorOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorOption {
    pub name: String,
    pub hex: String,
    pub finish: String,
    pub img: String,
}

impl Variant {
    /// Reason this variant must be skipped, if any. Malformed entries never
    /// reach SQL text.
    pub fn shape_problem(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("empty variant name")
        } else if self.price < 0 {
            Some("negative price")
        } else {
            None
        }
    }
}

impl ColorOption {
    pub fn shape_problem(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("empty color name")
        } else if self.hex.trim().is_empty() {
            Some("missing hex code")
        } else if self.finish.trim().is_empty() {
            Some("missing finish label")
        } else if self.img.trim().is_empty() {
            Some("missing image path")
        } else {
            None
        }
    }
}
