//!
//! pgdoc catalog row loader
//! ------------------------
//! Issues the five fixed catalog queries (namespaces, classes, attributes,
//! types, procedures) over an open read-only connection and returns the raw
//! rows, keyed by column name. Each primary catalog view is LEFT JOINed with
//! `pg_description` where the entity model consumes a description, so
//! undocumented objects still produce a row with a null description.
//!
//! This layer performs no retries and no partial-result suppression: a
//! partial catalog is never acceptable for documentation generation, so any
//! query error propagates unchanged to the caller.

use tokio_postgres::{Client, Row};
use tracing::debug;

use crate::error::DocResult;

const NAMESPACE_QUERY: &str = "\
SELECT pg_namespace.oid, nspname AS name, pg_description.description \
FROM pg_namespace \
LEFT JOIN pg_description ON pg_description.objoid = pg_namespace.oid \
ORDER BY nspname";

const CLASS_QUERY: &str = "\
SELECT pg_class.oid, relnamespace AS namespace, relname AS name, relkind::text AS kind, pg_description.description \
FROM pg_class \
LEFT JOIN pg_description ON pg_description.objoid = pg_class.oid AND pg_description.objsubid = 0 \
ORDER BY relname";

const ATTRIBUTE_QUERY: &str = "\
SELECT attrelid AS relation, attnum AS position, attname AS name, atttypid AS type, pg_description.description \
FROM pg_attribute \
LEFT JOIN pg_description ON pg_description.objoid = attrelid AND pg_description.objsubid = attnum \
WHERE NOT attisdropped \
ORDER BY attrelid, attnum";

const TYPE_QUERY: &str = "\
SELECT pg_type.oid, typnamespace AS namespace, typname AS name, typelem AS element, \
pg_catalog.format_type(pg_type.oid, NULL) AS display \
FROM pg_type";

const FUNCTION_QUERY: &str = "\
SELECT pg_proc.oid, pronamespace AS namespace, proname AS name, \
proargtypes::text AS argtypes, proargnames AS argnames, \
pg_catalog.format_type(prorettype, NULL) AS result, pg_description.description \
FROM pg_proc \
LEFT JOIN pg_description ON pg_description.objoid = pg_proc.oid \
ORDER BY proname";

/// Raw result rows for one full catalog read, one vector per entity kind.
pub struct CatalogRows {
    pub namespaces: Vec<Row>,
    pub classes: Vec<Row>,
    pub attributes: Vec<Row>,
    pub types: Vec<Row>,
    pub functions: Vec<Row>,
}

/// Run all five catalog queries in sequence and return the raw rows.
pub async fn fetch(client: &Client) -> DocResult<CatalogRows> {
    let namespaces = client.query(NAMESPACE_QUERY, &[]).await?;
    let classes = client.query(CLASS_QUERY, &[]).await?;
    let attributes = client.query(ATTRIBUTE_QUERY, &[]).await?;
    let types = client.query(TYPE_QUERY, &[]).await?;
    let functions = client.query(FUNCTION_QUERY, &[]).await?;
    debug!(
        namespaces = namespaces.len(),
        classes = classes.len(),
        attributes = attributes.len(),
        types = types.len(),
        functions = functions.len(),
        "catalog rows fetched"
    );
    Ok(CatalogRows { namespaces, classes, attributes, types, functions })
}
