use std::sync::Arc;

use pgdoc::model::{
    assemble_arguments, Attribute, Database, Function, Oid, PgType, Relation, RelationKind, Schema,
};
use pgdoc::reference::LazyRef;
use pgdoc::report::{self, ReportOptions};

// A small two-schema snapshot with a documented table, a sequence, an array
// column and one function, plus system schemas that default selection must
// skip.
fn snapshot() -> Database {
    let mut db = Database::default();

    for (oid, name, description) in [
        (1u32, "trend", Some("Trend storage.")),
        (2, "attribute", None),
        (3, "pg_catalog", None),
        (4, "information_schema", None),
    ] {
        db.schemas.insert(
            Oid(oid),
            Arc::new(Schema {
                oid: Oid(oid),
                name: name.into(),
                description: description.map(|d| d.to_string()),
            }),
        );
    }

    for (oid, name, display, body) in [
        (23u32, "int4", "integer", None),
        (25, "text", "text", None),
        (1007, "_int4", "integer[]", Some(23u32)),
    ] {
        db.types.insert(
            Oid(oid),
            Arc::new(PgType {
                oid: Oid(oid),
                schema: LazyRef::new(Oid(3)),
                name: name.into(),
                display: display.into(),
                body: match body {
                    Some(elem) => pgdoc::model::TypeBody::Array { element: LazyRef::new(Oid(elem)) },
                    None => pgdoc::model::TypeBody::Scalar,
                },
            }),
        );
    }

    db.relations.insert(
        Oid(10),
        Arc::new(Relation {
            oid: Oid(10),
            schema: LazyRef::new(Oid(1)),
            name: "measurement".into(),
            kind: RelationKind::Table,
            description: Some("One row per sample.".into()),
        }),
    );
    db.relations.insert(
        Oid(11),
        Arc::new(Relation {
            oid: Oid(11),
            schema: LazyRef::new(Oid(1)),
            name: "measurement_id_seq".into(),
            kind: RelationKind::Other,
            description: None,
        }),
    );

    for (pos, name, ty, description) in [
        (1i16, "id", 23u32, Some("Sample key.")),
        (2, "samples", 1007, None),
        (-2, "xmin", 23, None),
    ] {
        db.attributes.push(Attribute {
            relation: LazyRef::new(Oid(10)),
            position: pos,
            name: name.into(),
            ty: LazyRef::new(Oid(ty)),
            description: description.map(|d| d.to_string()),
        });
    }

    db.functions.insert(
        Oid(100),
        Arc::new(Function {
            oid: Oid(100),
            schema: LazyRef::new(Oid(1)),
            name: "add_sample".into(),
            arguments: assemble_arguments("23 25", None).expect("assemble failed"),
            result: "boolean".into(),
            description: Some("Record one sample.\n\nReturns true on insert.".into()),
        }),
    );

    db
}

fn combined(db: &Database, opts: &ReportOptions) -> String {
    let schemas = report::resolve_schemas(db, &opts.schemas).expect("resolve failed");
    let mut out: Vec<u8> = Vec::new();
    report::write_combined(db, &schemas, opts, &mut out).expect("write failed");
    String::from_utf8(out).expect("non-utf8 output")
}

#[test]
fn explicit_schema_list_restricts_and_orders_output() {
    let db = snapshot();
    let opts = ReportOptions {
        schemas: vec!["attribute".to_string(), "trend".to_string()],
        ..Default::default()
    };
    let text = combined(&db, &opts);
    let attribute = text.find("attribute\n=========").expect("attribute section missing");
    let trend = text.find("trend\n=====").expect("trend section missing");
    assert!(attribute < trend, "caller order not preserved");
    assert!(!text.contains("pg_catalog"));
}

#[test]
fn default_selection_documents_all_non_system_schemas() {
    let db = snapshot();
    let text = combined(&db, &ReportOptions::default());
    assert!(text.contains("trend\n====="));
    assert!(text.contains("attribute\n========="));
    assert!(!text.contains("pg_catalog\n"));
    assert!(!text.contains("information_schema\n"));
}

#[test]
fn missing_schema_name_fails_distinguishably() {
    let db = snapshot();
    let err =
        report::resolve_schemas(&db, &["nosuch".to_string()]).expect_err("expected failure");
    assert_eq!(err.code_str(), "no_schema");
    assert!(err.message().contains("nosuch"));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn combined_output_renders_columns_and_signature() {
    let db = snapshot();
    let opts = ReportOptions { schemas: vec!["trend".to_string()], ..Default::default() };
    let text = combined(&db, &opts);
    // table columns with array display, system column excluded
    assert!(text.contains("| id"));
    assert!(text.contains("integer[]"));
    assert!(text.contains("Sample key."));
    assert!(!text.contains("xmin"));
    // sequence appears as a bare heading
    assert!(text.contains("measurement_id_seq\n~~~~~~~~~~~~~~~~~~"));
    // function signature and description
    assert!(text.contains("``add_sample(integer, text) -> boolean``"));
    assert!(text.contains("Returns true on insert."));
}

#[test]
fn fragment_flags_restrict_output() {
    let db = snapshot();
    let tables_only = ReportOptions {
        schemas: vec!["trend".to_string()],
        functions: false,
        ..Default::default()
    };
    let text = combined(&db, &tables_only);
    assert!(text.contains("Tables\n------"));
    assert!(!text.contains("Functions\n---------"));

    let functions_only = ReportOptions {
        schemas: vec!["trend".to_string()],
        tables: false,
        ..Default::default()
    };
    let text = combined(&db, &functions_only);
    assert!(!text.contains("Tables\n------"));
    assert!(text.contains("Functions\n---------"));
}

#[test]
fn output_directory_gets_one_file_per_schema_plus_index() {
    let db = snapshot();
    let dir = tempfile::tempdir().expect("tempdir failed");
    let opts = ReportOptions { out_dir: Some(dir.path().join("schemas")), ..Default::default() };
    report::run(&db, &opts).expect("run failed");

    let root = dir.path().join("schemas");
    let trend = std::fs::read_to_string(root.join("trend.rst")).expect("trend.rst missing");
    assert!(trend.starts_with("trend\n=====\n"));
    assert!(std::fs::read_to_string(root.join("attribute.rst")).is_ok());

    let index = std::fs::read_to_string(root.join("index.rst")).expect("index.rst missing");
    assert!(index.starts_with("Schemas\n=======\n"));
    assert!(index.contains("   attribute"));
    assert!(index.contains("   trend"));
    assert!(!index.contains("pg_catalog"));
}

#[test]
fn dangling_type_reference_aborts_rendering() {
    let mut db = snapshot();
    db.attributes.push(Attribute {
        relation: LazyRef::new(Oid(10)),
        position: 3,
        name: "orphan".into(),
        ty: LazyRef::new(Oid(99999)),
        description: None,
    });
    let opts = ReportOptions { schemas: vec!["trend".to_string()], ..Default::default() };
    let schemas = report::resolve_schemas(&db, &opts.schemas).expect("resolve failed");
    let mut out: Vec<u8> = Vec::new();
    let err =
        report::write_combined(&db, &schemas, &opts, &mut out).expect_err("expected failure");
    assert_eq!(err.code_str(), "dangling_ref");
    assert_eq!(err.exit_code(), 4);
}
