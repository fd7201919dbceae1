use serde_json::json;

use crate::sql::{self, SqlValue};

/// Emits the statements that point already-inserted catalog rows at a
/// downloaded gallery: per target a wipe of the old 360 asset rows and one
/// `cat_assets` insert per frame, then an update of the SKU row's primary
/// image. The specs patch is merged with `||`, never a wholesale replace.
pub fn emit_asset_links(
    sku_id: &str,
    color_def_id: Option<&str>,
    urls: &[String],
) -> Vec<String> {
    let mut out = Vec::new();
    if urls.is_empty() {
        return out;
    }

    let targets: Vec<&str> = std::iter::once(sku_id).chain(color_def_id).collect();
    for target in &targets {
        out.push(format!(
            "DELETE FROM cat_assets WHERE item_id = {} AND type = '360';",
            sql::quote(target)
        ));
        for (index, url) in urls.iter().enumerate() {
            out.push(sql::insert(
                "cat_assets",
                &[
                    ("item_id", SqlValue::text(*target)),
                    ("type", SqlValue::text("360")),
                    ("url", SqlValue::text(url)),
                    ("position", SqlValue::Int(index as i64 + 1)),
                    ("is_primary", SqlValue::Bool(index == 0)),
                ],
            ));
        }
    }

    let primary = &urls[0];
    let patch = json!({ "primary_image": primary });
    out.push(format!(
        "UPDATE cat_items SET image_url = {}, specs = specs || {}::jsonb WHERE id = {};",
        sql::quote(primary),
        sql::quote(&patch.to_string()),
        sql::quote(sku_id)
    ));

    out
}
