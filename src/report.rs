//!
//! pgdoc report orchestration
//! --------------------------
//! Selects schemas and fragments for one run and routes the rendered text to
//! its output target: a single combined stream, or one file per schema plus
//! an `index.rst` listing every rendered schema. File handles are scoped per
//! schema: opened, written and closed before the next schema starts.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::DocResult;
use crate::model::{Database, Schema};
use crate::render;

/// Schemas never documented unless named explicitly.
pub const SYSTEM_SCHEMAS: [&str; 3] = ["pg_catalog", "information_schema", "pg_toast"];

/// One report run's configuration.
pub struct ReportOptions {
    /// Explicit schema names in caller order; empty means every non-system
    /// schema.
    pub schemas: Vec<String>,
    pub tables: bool,
    pub functions: bool,
    /// Per-schema files under this directory when set, stdout otherwise.
    pub out_dir: Option<PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions { schemas: Vec::new(), tables: true, functions: true, out_dir: None }
    }
}

/// Resolve the schema list for a run. Explicit names keep caller order and
/// fail on the first unknown name; the default is every schema not on the
/// system exclusion list, name-ascending.
pub fn resolve_schemas<'db>(db: &'db Database, names: &[String]) -> DocResult<Vec<&'db Arc<Schema>>> {
    if names.is_empty() {
        let mut out: Vec<&Arc<Schema>> = db
            .schemas
            .values()
            .filter(|s| !SYSTEM_SCHEMAS.contains(&s.name.as_str()))
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    } else {
        names.iter().map(|name| db.schema_by_name(name)).collect()
    }
}

/// Render one schema's full document as a string.
pub fn render_schema(db: &Database, schema: &Schema, opts: &ReportOptions) -> DocResult<String> {
    let lines = render::schema_section(db, schema, opts.tables, opts.functions)?;
    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// Write every selected schema to one combined stream.
pub fn write_combined<W: Write>(
    db: &Database,
    schemas: &[&Arc<Schema>],
    opts: &ReportOptions,
    out: &mut W,
) -> DocResult<()> {
    for schema in schemas {
        out.write_all(render_schema(db, schema, opts)?.as_bytes())?;
    }
    Ok(())
}

/// The index document: a heading plus a toctree naming every rendered schema
/// in cross-reference order.
fn index_document(schemas: &[&Arc<Schema>]) -> String {
    let mut lines = render::heading("Schemas", 0);
    lines.push(String::new());
    lines.push(".. toctree::".to_string());
    lines.push("   :maxdepth: 1".to_string());
    lines.push(String::new());
    for schema in schemas {
        lines.push(format!("   {}", schema.name));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Run one report generation pass over the snapshot.
pub fn run(db: &Database, opts: &ReportOptions) -> DocResult<()> {
    let schemas = resolve_schemas(db, &opts.schemas)?;
    match &opts.out_dir {
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_combined(db, &schemas, opts, &mut lock)?;
        }
        Some(dir) => {
            fs::create_dir_all(dir)?;
            for schema in &schemas {
                let path = dir.join(format!("{}.rst", schema.name));
                fs::write(&path, render_schema(db, schema, opts)?)?;
                info!(schema = %schema.name, path = %path.display(), "schema documented");
            }
            fs::write(dir.join("index.rst"), index_document(&schemas))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Oid;

    fn snapshot() -> Database {
        let mut db = Database::default();
        for (oid, name) in [(1u32, "delta"), (2, "alpha"), (3, "pg_catalog"), (4, "pg_toast")] {
            db.schemas.insert(
                Oid(oid),
                Arc::new(Schema { oid: Oid(oid), name: name.into(), description: None }),
            );
        }
        db
    }

    #[test]
    fn default_selection_skips_system_schemas() {
        let db = snapshot();
        let schemas = resolve_schemas(&db, &[]).expect("resolve failed");
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "delta"]);
    }

    #[test]
    fn explicit_selection_keeps_caller_order() {
        let db = snapshot();
        let names = vec!["delta".to_string(), "alpha".to_string()];
        let schemas = resolve_schemas(&db, &names).expect("resolve failed");
        let got: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(got, vec!["delta", "alpha"]);
    }

    #[test]
    fn unknown_schema_name_is_an_error() {
        let db = snapshot();
        let err = resolve_schemas(&db, &["nosuch".to_string()]).expect_err("expected failure");
        assert_eq!(err.code_str(), "no_schema");
    }

    #[test]
    fn index_lists_schemas_in_render_order() {
        let db = snapshot();
        let schemas = resolve_schemas(&db, &[]).unwrap();
        let index = index_document(&schemas);
        assert!(index.starts_with("Schemas\n=======\n"));
        let alpha = index.find("   alpha").expect("alpha missing");
        let delta = index.find("   delta").expect("delta missing");
        assert!(alpha < delta);
        assert!(!index.contains("pg_catalog"));
    }
}
