use serde_json::{Map, Value, json};
use tracing::warn;
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::models::Family;
use crate::sql::{self, SqlValue};

/// Source of fresh row identifiers. Production uses random UUIDs; tests
/// inject a deterministic sequence.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Lower-cased, space-to-hyphen, parentheses stripped. Pure function of the
/// input name; uniqueness is the database's problem.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace(['(', ')'], "")
}

/// Walks one family description and produces the ordered statement list:
/// FAMILY first, then per variant its VARIANT row followed by each color's
/// COLOR_DEF, SKU and jurisdiction price row. Every parent id is emitted
/// before any child that references it. Malformed variants and colors are
/// skipped with a warning and contribute nothing to the output.
pub fn emit_family(family: &Family, config: &SeedConfig, ids: &mut dyn IdSource) -> Vec<String> {
    let mut out = Vec::new();

    let family_id = ids.next_id();
    out.push(format!("-- FAMILY: {}", family.name));
    out.push(sql::insert(
        "cat_items",
        &[
            ("id", SqlValue::text(&family_id)),
            ("brand_id", SqlValue::text(&config.brand_id)),
            ("template_id", SqlValue::text(&config.template_id)),
            ("type", SqlValue::text("FAMILY")),
            ("name", SqlValue::text(&family.name)),
            ("slug", SqlValue::text(&family.slug)),
            ("status", SqlValue::text("ACTIVE")),
            ("specs", SqlValue::Jsonb(Value::Object(family.specs.clone()))),
        ],
    ));

    for variant in &family.variants {
        if let Some(problem) = variant.shape_problem() {
            warn!(variant = %variant.name, problem, "skipping malformed variant");
            continue;
        }

        let variant_id = ids.next_id();
        let variant_slug = format!("{}-{}", family.slug, slugify(&variant.name));
        out.push(format!("\n-- VARIANT: {}", variant.name));
        out.push(sql::insert(
            "cat_items",
            &[
                ("id", SqlValue::text(&variant_id)),
                ("parent_id", SqlValue::text(&family_id)),
                ("brand_id", SqlValue::text(&config.brand_id)),
                ("template_id", SqlValue::text(&config.template_id)),
                ("type", SqlValue::text("VARIANT")),
                ("name", SqlValue::text(&variant.name)),
                ("slug", SqlValue::text(&variant_slug)),
                ("status", SqlValue::text("ACTIVE")),
                ("price_base", SqlValue::Int(variant.price)),
                ("specs", SqlValue::Jsonb(Value::Object(variant.specs.clone()))),
            ],
        ));

        for (index, color) in variant.skus.iter().enumerate() {
            if let Some(problem) = color.shape_problem() {
                warn!(
                    variant = %variant.name,
                    color = %color.name,
                    problem,
                    "skipping malformed color entry"
                );
                continue;
            }

            let color_id = ids.next_id();
            let color_slug = format!("{}-color-{}", variant_slug, slugify(&color.name));
            let mut color_specs = Map::new();
            color_specs.insert("Color".into(), json!(color.name));
            color_specs.insert("Finish".into(), json!(color.finish));
            color_specs.insert("hex_primary".into(), json!(color.hex));
            color_specs.insert("primary_image".into(), json!(color.img));

            out.push(format!("  -- COLOR_DEF: {}", color.name));
            out.push(sql::insert(
                "cat_items",
                &[
                    ("id", SqlValue::text(&color_id)),
                    ("parent_id", SqlValue::text(&variant_id)),
                    ("brand_id", SqlValue::text(&config.brand_id)),
                    ("template_id", SqlValue::text(&config.template_id)),
                    ("type", SqlValue::text("COLOR_DEF")),
                    ("name", SqlValue::text(&color.name)),
                    ("slug", SqlValue::text(&color_slug)),
                    ("status", SqlValue::text("ACTIVE")),
                    ("position", SqlValue::Int(index as i64 + 1)),
                    ("specs", SqlValue::Jsonb(Value::Object(color_specs))),
                ],
            ));

            let sku_id = ids.next_id();
            let sku_name = format!("{} - {}", variant.name, color.name);
            out.push(format!("    -- SKU: {sku_name}"));
            out.push(sql::insert(
                "cat_items",
                &[
                    ("id", SqlValue::text(&sku_id)),
                    ("parent_id", SqlValue::text(&color_id)),
                    ("brand_id", SqlValue::text(&config.brand_id)),
                    ("template_id", SqlValue::text(&config.template_id)),
                    ("type", SqlValue::text("SKU")),
                    ("name", SqlValue::text(&sku_name)),
                    ("slug", SqlValue::text(format!("{color_slug}-sku"))),
                    ("status", SqlValue::text("ACTIVE")),
                    ("price_base", SqlValue::Int(variant.price)),
                    ("image_url", SqlValue::text(&color.img)),
                ],
            ));

            out.push(sql::insert(
                "cat_price_state",
                &[
                    ("vehicle_color_id", SqlValue::text(&sku_id)),
                    ("state_code", SqlValue::text(&config.state_code)),
                    ("ex_showroom_price", SqlValue::Int(variant.price - config.discount)),
                    ("is_active", SqlValue::Bool(true)),
                    ("district", SqlValue::text(&config.district)),
                    ("gst_rate", SqlValue::text(config.gst_rate.to_string())),
                    ("hsn_code", SqlValue::text(&config.hsn_code)),
                    ("publish_stage", SqlValue::text("DRAFT")),
                ],
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorOption, Variant};
    use serde_json::Map;

    fn test_config() -> SeedConfig {
        serde_json::from_value(serde_json::json!({
            "brand_id": "aff9a671-6e98-4d7e-8af1-b7823238a00e",
            "template_id": "c49556f3-b89f-49d0-a191-b3277d6b5d04"
        }))
        .unwrap()
    }

    struct SeqSource(u32);

    impl IdSource for SeqSource {
        fn next_id(&mut self) -> String {
            self.0 += 1;
            format!("id-{:04}", self.0)
        }
    }

    fn color(name: &str, hex: &str) -> ColorOption {
        ColorOption {
            name: name.into(),
            hex: hex.into(),
            finish: "Gloss".into(),
            img: format!("/media/tvs/test/{}/primary.webp", slugify(name)),
        }
    }

    fn sample_family() -> Family {
        Family {
            name: "Apache RTR 160 2V".into(),
            slug: "tvs-apache-rtr-160-2v".into(),
            specs: Map::new(),
            variants: vec![
                Variant {
                    name: "RM Drum".into(),
                    price: 101890,
                    specs: Map::new(),
                    skus: vec![
                        color("Gloss Black", "#000000"),
                        color("Pearl White", "#F8F6F0"),
                    ],
                },
                Variant {
                    name: "RM Disc".into(),
                    price: 116090,
                    specs: Map::new(),
                    skus: vec![color("Racing Red", "#FF0000")],
                },
            ],
        }
    }

    fn inserts(statements: &[String]) -> Vec<&String> {
        statements
            .iter()
            .filter(|s| s.trim_start().starts_with("INSERT"))
            .collect()
    }

    #[test]
    fn statement_count_matches_hierarchy() {
        let mut ids = SeqSource(0);
        let statements = emit_family(&sample_family(), &test_config(), &mut ids);
        // 1 family + 2 variants + 3 colors x (color_def + sku + price row)
        assert_eq!(inserts(&statements).len(), 1 + 2 + 3 * 3);
    }

    #[test]
    fn slugs_are_deterministic() {
        assert_eq!(slugify("RM Drum (Black Edition)"), "rm-drum-black-edition");
        assert_eq!(slugify("RM Drum (Black Edition)"), "rm-drum-black-edition");
        assert_eq!(slugify("Pearl White"), "pearl-white");
    }

    #[test]
    fn parent_ids_are_emitted_before_use() {
        let mut ids = SeqSource(0);
        let statements = emit_family(&sample_family(), &test_config(), &mut ids);

        let mut seen: Vec<String> = Vec::new();
        for stmt in inserts(&statements) {
            let row_ids: Vec<String> = stmt
                .split('\'')
                .filter(|token| token.starts_with("id-"))
                .map(str::to_string)
                .collect();

            if stmt.contains("cat_price_state") {
                // price rows only reference, they do not mint ids
                assert!(seen.contains(&row_ids[0]), "{} before insert", row_ids[0]);
            } else {
                for parent in &row_ids[1..] {
                    assert!(seen.contains(parent), "{parent} referenced before insert");
                }
                seen.push(row_ids[0].clone());
            }
        }
    }

    #[test]
    fn price_row_applies_fixed_discount() {
        let mut ids = SeqSource(0);
        let statements = emit_family(&sample_family(), &test_config(), &mut ids);
        let price_rows: Vec<&String> = statements
            .iter()
            .filter(|s| s.contains("cat_price_state"))
            .collect();
        assert_eq!(price_rows.len(), 3);
        assert!(price_rows[0].contains("101889"));
        assert!(price_rows[2].contains("116089"));
        assert!(price_rows.iter().all(|s| s.contains("'DRAFT'")));
    }

    #[test]
    fn end_to_end_single_variant() {
        let family = Family {
            name: "Apache RTR 160 2V".into(),
            slug: "tvs-apache-rtr-160-2v".into(),
            specs: Map::new(),
            variants: vec![Variant {
                name: "RM Drum".into(),
                price: 101890,
                specs: Map::new(),
                skus: vec![ColorOption {
                    name: "Pearl White".into(),
                    hex: "#F8F6F0".into(),
                    finish: "Gloss".into(),
                    img: "/x/primary.webp".into(),
                }],
            }],
        };
        let mut ids = SeqSource(0);
        let statements = emit_family(&family, &test_config(), &mut ids);
        let inserts = inserts(&statements);
        assert_eq!(inserts.len(), 5);

        assert!(inserts[1].contains("'VARIANT'") && inserts[1].contains("101890"));
        assert!(
            inserts[2].contains("'COLOR_DEF'")
                && inserts[2].contains("\"hex_primary\":\"#F8F6F0\"")
                && inserts[2].contains("position, specs) VALUES")
                && inserts[2].contains(", 1, ")
        );
        assert!(inserts[3].contains("'RM Drum - Pearl White'") && inserts[3].contains("101890"));
        assert!(inserts[4].contains("cat_price_state") && inserts[4].contains("101889"));
    }

    #[test]
    fn malformed_entries_are_skipped_not_emitted() {
        let mut family = sample_family();
        family.variants[0].skus[1].hex = String::new();
        family.variants.push(Variant {
            name: "".into(),
            price: 99000,
            specs: Map::new(),
            skus: vec![color("Ghost Grey", "#808080")],
        });

        let mut ids = SeqSource(0);
        let statements = emit_family(&family, &test_config(), &mut ids);
        // dropped one color (3 rows) and one whole variant (1 + 3 rows)
        assert_eq!(inserts(&statements).len(), 1 + 2 + 2 * 3);
        assert!(!statements.iter().any(|s| s.contains("Ghost Grey")));
    }

    #[test]
    fn name_with_quote_is_escaped() {
        let mut family = sample_family();
        family.variants[0].skus[0].name = "Racer's Red".into();
        let mut ids = SeqSource(0);
        let statements = emit_family(&family, &test_config(), &mut ids);
        assert!(statements.iter().any(|s| s.contains("'Racer''s Red'")));
        assert!(!statements.iter().any(|s| s.contains("'Racer's Red'")));
    }
}
