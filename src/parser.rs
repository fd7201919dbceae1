use anyhow::{Context, Result, bail};
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::warn;

use crate::emitter::slugify;
use crate::models::{ColorOption, Family, Variant};

/// Locates the script tag whose body contains `marker` and parses the
/// balanced JSON object that follows it. The catalog sites under scrape all
/// inject their state as `window.<something> = {...};` in a script tag.
pub fn extract_embedded_json(html: &str, marker: &str) -> Result<Value> {
    let doc = Html::parse_document(html);
    let script_selector = Selector::parse("script").unwrap();

    for element in doc.select(&script_selector) {
        let text: String = element.text().collect();
        let Some(pos) = text.find(marker) else {
            continue;
        };
        let tail = &text[pos + marker.len()..];
        let start = tail
            .find('{')
            .with_context(|| format!("no JSON object after marker {marker:?}"))?;
        let blob = balanced_object(&tail[start..])
            .with_context(|| format!("unbalanced JSON object after marker {marker:?}"))?;
        return serde_json::from_str(blob)
            .with_context(|| format!("embedded block after {marker:?} is not valid JSON"));
    }

    bail!("no script tag containing marker {marker:?}")
}

/// Slice of the leading balanced `{...}` object, tolerating braces inside
/// string literals.
fn balanced_object(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Depth-first search for the first subtree whose `key` field equals
/// `expected`. Object entries are visited before array elements.
pub fn find_node<'a>(value: &'a Value, key: &str, expected: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if map.get(key).and_then(Value::as_str) == Some(expected) {
                return Some(value);
            }
            map.values().find_map(|v| find_node(v, key, expected))
        }
        Value::Array(items) => items.iter().find_map(|v| find_node(v, key, expected)),
        _ => None,
    }
}

/// Reshapes a matched model subtree into the typed catalog description.
/// Field names vary across the scraped sites, so each lookup tries the known
/// spellings. Entries that fail the shape constraints are skipped with a
/// warning; only a missing family name is fatal for the item.
pub fn catalog_from_tree(node: &Value, brand_slug: &str) -> Result<Family> {
    let name = str_field(node, &["name", "modelName", "model_name"])
        .context("model node has no name field")?
        .to_string();
    let slug = format!("{brand_slug}-{}", slugify(&name));
    let specs = object_field(node, &["specs", "specifications"]);

    let mut variants = Vec::new();
    for raw in array_field(node, &["variants", "trims"]) {
        match variant_from_tree(raw) {
            Ok(variant) => variants.push(variant),
            Err(e) => warn!(error = %e, "skipping variant entry"),
        }
    }

    Ok(Family {
        name,
        slug,
        specs,
        variants,
    })
}

fn variant_from_tree(node: &Value) -> Result<Variant> {
    let name = str_field(node, &["name", "variantName", "variant_name"])
        .context("variant has no name")?
        .to_string();
    let price =
        price_field(node).with_context(|| format!("variant {name:?} has no usable price"))?;
    let specs = object_field(node, &["specs", "specifications"]);

    let mut skus = Vec::new();
    for raw in array_field(node, &["skus", "colors", "colours"]) {
        match color_from_tree(raw) {
            Ok(color) => skus.push(color),
            Err(e) => warn!(variant = %name, error = %e, "skipping color entry"),
        }
    }

    Ok(Variant {
        name,
        price,
        specs,
        skus,
    })
}

fn color_from_tree(node: &Value) -> Result<ColorOption> {
    let name = str_field(node, &["name", "colorName", "colour_name"])
        .context("color has no name")?
        .to_string();
    let hex = str_field(node, &["hex", "hexCode", "hex_primary"])
        .with_context(|| format!("color {name:?} has no hex code"))?
        .to_string();
    let finish = str_field(node, &["finish", "finishType"])
        .unwrap_or("Gloss")
        .to_string();
    let img = str_field(node, &["img", "image", "image_url", "imageUrl"])
        .with_context(|| format!("color {name:?} has no image path"))?
        .to_string();

    Ok(ColorOption {
        name,
        hex,
        finish,
        img,
    })
}

fn str_field<'a>(node: &'a Value, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|n| node.get(n).and_then(Value::as_str))
}

fn array_field<'a>(node: &'a Value, names: &[&str]) -> &'a [Value] {
    names
        .iter()
        .find_map(|n| node.get(n).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn object_field(node: &Value, names: &[&str]) -> Map<String, Value> {
    names
        .iter()
        .find_map(|n| node.get(n).and_then(Value::as_object))
        .cloned()
        .unwrap_or_default()
}

fn price_field(node: &Value) -> Option<i64> {
    let raw = ["price", "exShowroomPrice", "ex_showroom_price"]
        .iter()
        .find_map(|n| node.get(n))?;
    match raw {
        Value::Number(n) => n.as_i64(),
        // some pages carry the price as a digit string
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
