use serde_json::Value;

/// A literal destined for one column of a generated statement. Rendering is
/// centralized here so quoting rules are applied everywhere, never ad hoc
/// format strings with raw user text.
pub enum SqlValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Jsonb(Value),
}

impl SqlValue {
    pub fn text(s: impl Into<String>) -> Self {
        SqlValue::Text(s.into())
    }

    fn render(&self) -> String {
        match self {
            SqlValue::Text(s) => quote(s),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Jsonb(v) => format!("{}::jsonb", quote(&v.to_string())),
        }
    }
}

/// Single-quoted literal with embedded quotes doubled.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn insert(table: &str, columns: &[(&str, SqlValue)]) -> String {
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let values: Vec<String> = columns.iter().map(|(_, value)| value.render()).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        names.join(", "),
        values.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_doubles_embedded_quotes() {
        assert_eq!(quote("D'Souza Grey"), "'D''Souza Grey'");
    }

    #[test]
    fn insert_renders_each_value_kind() {
        let stmt = insert(
            "cat_items",
            &[
                ("id", SqlValue::text("abc")),
                ("price_base", SqlValue::Int(101890)),
                ("is_active", SqlValue::Bool(true)),
                ("specs", SqlValue::Jsonb(json!({"finish": "Gloss"}))),
            ],
        );
        assert_eq!(
            stmt,
            "INSERT INTO cat_items (id, price_base, is_active, specs) \
             VALUES ('abc', 101890, true, '{\"finish\":\"Gloss\"}'::jsonb);"
        );
    }

    #[test]
    fn jsonb_with_quote_in_value_stays_valid() {
        let stmt = insert(
            "cat_items",
            &[("specs", SqlValue::Jsonb(json!({"Color": "Racer's Red"})))],
        );
        assert!(stmt.contains("Racer''s Red"));
    }
}
