use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Writes the statement sequence as newline-joined text to `out`, or to
/// stdout when no path is given. Statement order is preserved exactly; the
/// header comment records when the file was generated. Nothing here ever
/// touches a database.
pub fn write_statements(statements: &[String], out: Option<&Path>) -> Result<()> {
    let header = format!("-- generated by catseed at {}", chrono::Utc::now().to_rfc3339());
    let body = format!("{header}\n{}\n", statements.join("\n"));

    match out {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(body.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => print!("{body}"),
    }
    Ok(())
}

/// Writes a curated catalog description as pretty JSON, for manual review
/// before it is fed to the seed step.
pub fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_newline_joined_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.sql");
        let statements = vec!["INSERT 1;".to_string(), "INSERT 2;".to_string()];
        write_statements(&statements, Some(&path)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("-- generated by catseed at "));
        assert!(written.ends_with("INSERT 1;\nINSERT 2;\n"));
    }
}
