//!
//! pgdoc entity model
//! ------------------
//! Typed in-memory representation of one catalog snapshot: schemas, relations,
//! attributes, types and functions, each keyed by its catalog oid. The whole
//! model is built once per run from a single sequential catalog read and is
//! immutable afterwards; cross-references between entities are held as
//! [`LazyRef`] values that resolve against the snapshot on first use.
//!
//! Key responsibilities:
//! - Construct entities from raw catalog rows (see `loader`).
//! - Classify relations by their catalog kind discriminator and types by
//!   their element-type field.
//! - Assemble function arguments from the catalog's whitespace-separated
//!   argument-type list and optional argument-name array.
//! - Answer ownership scans (relations/functions of a schema, attributes of
//!   a relation) over the full snapshot.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tokio_postgres::Row;
use tracing::debug;

use crate::error::{DocError, DocResult};
use crate::loader::{self, CatalogRows};
use crate::reference::LazyRef;

/// Catalog object identifier. Unique within an entity kind, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(pub u32);

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A namespace. Relations and functions belonging to it are derived by
/// scanning the snapshot, never stored on the schema itself.
#[derive(Debug)]
pub struct Schema {
    pub oid: Oid,
    pub name: String,
    pub description: Option<String>,
}

impl Schema {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Closed relation-kind classification. Only the ordinary-table discriminator
/// maps to `Table`; every other kind (view, sequence, index, ...) is `Other`
/// and is documented by its name heading alone, without a column listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Table,
    Other,
}

impl RelationKind {
    /// Classify a `pg_class.relkind` discriminator.
    pub fn from_discriminator(kind: &str) -> RelationKind {
        match kind {
            "r" => RelationKind::Table,
            _ => RelationKind::Other,
        }
    }
}

#[derive(Debug)]
pub struct Relation {
    pub oid: Oid,
    pub schema: LazyRef<Schema>,
    pub name: String,
    pub kind: RelationKind,
    pub description: Option<String>,
}

impl Relation {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// A column of a relation. Ordinal positions <= 0 are system columns and are
/// excluded from rendering.
#[derive(Debug)]
pub struct Attribute {
    pub relation: LazyRef<Relation>,
    pub position: i16,
    pub name: String,
    pub ty: LazyRef<PgType>,
    pub description: Option<String>,
}

impl Attribute {
    pub fn is_system(&self) -> bool {
        self.position <= 0
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Scalar/array classification for a type row. A type is an array when the
/// catalog declares a positive element-type oid for it.
#[derive(Debug)]
pub enum TypeBody {
    Scalar,
    Array { element: LazyRef<PgType> },
}

#[derive(Debug)]
pub struct PgType {
    pub oid: Oid,
    pub schema: LazyRef<Schema>,
    pub name: String,
    /// Fully-qualified display name as reported by the catalog.
    pub display: String,
    pub body: TypeBody,
}

impl PgType {
    /// Display string for documentation: the catalog-reported name for a
    /// scalar, `element[]` for an array.
    pub fn display_name(&self, db: &Database) -> DocResult<String> {
        match &self.body {
            TypeBody::Scalar => Ok(self.display.clone()),
            TypeBody::Array { element } => {
                let element = element.resolve(db)?;
                Ok(format!("{}[]", element.display_name(db)?))
            }
        }
    }
}

/// One function argument: a possibly empty name paired with a type reference.
#[derive(Debug)]
pub struct Argument {
    pub name: String,
    pub ty: LazyRef<PgType>,
}

impl Argument {
    /// `name type` for a named argument, just the type for an unnamed one.
    pub fn display(&self, db: &Database) -> DocResult<String> {
        let ty = self.ty.resolve(db)?.display_name(db)?;
        if self.name.is_empty() {
            Ok(ty)
        } else {
            Ok(format!("{} {}", self.name, ty))
        }
    }
}

#[derive(Debug)]
pub struct Function {
    pub oid: Oid,
    pub schema: LazyRef<Schema>,
    pub name: String,
    pub arguments: Vec<Argument>,
    /// Return-type display string as reported by the catalog.
    pub result: String,
    pub description: Option<String>,
}

impl Function {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// First line of the description, for summary tables.
    pub fn synopsis(&self) -> &str {
        self.description().lines().next().unwrap_or("")
    }

    /// `name(arg, arg, ...) -> result`, arguments in catalog order.
    pub fn signature(&self, db: &Database) -> DocResult<String> {
        let mut args = Vec::with_capacity(self.arguments.len());
        for arg in &self.arguments {
            args.push(arg.display(db)?);
        }
        Ok(format!("{}({}) -> {}", self.name, args.join(", "), self.result))
    }
}

/// One immutable catalog snapshot. Built once per run; every lazy reference
/// in the model resolves against the maps held here.
#[derive(Debug, Default)]
pub struct Database {
    pub schemas: BTreeMap<Oid, Arc<Schema>>,
    pub relations: BTreeMap<Oid, Arc<Relation>>,
    pub types: BTreeMap<Oid, Arc<PgType>>,
    pub functions: BTreeMap<Oid, Arc<Function>>,
    /// All attributes of all relations, ordered by (relation, position).
    pub attributes: Vec<Attribute>,
}

impl Database {
    /// Load the full catalog snapshot over an open connection: one query per
    /// entity kind, in sequence. No cross-reference is resolved here; the
    /// maps only have to exist before the first `LazyRef::resolve` call.
    pub async fn load(client: &tokio_postgres::Client) -> DocResult<Database> {
        let rows = loader::fetch(client).await?;
        Self::from_rows(rows)
    }

    /// Construct the snapshot from raw catalog rows.
    pub fn from_rows(rows: CatalogRows) -> DocResult<Database> {
        let mut db = Database::default();
        for row in &rows.namespaces {
            let schema = Schema::from_row(row)?;
            db.schemas.insert(schema.oid, Arc::new(schema));
        }
        for row in &rows.classes {
            let relation = Relation::from_row(row)?;
            db.relations.insert(relation.oid, Arc::new(relation));
        }
        for row in &rows.types {
            let ty = PgType::from_row(row)?;
            db.types.insert(ty.oid, Arc::new(ty));
        }
        for row in &rows.functions {
            let function = Function::from_row(row)?;
            db.functions.insert(function.oid, Arc::new(function));
        }
        for row in &rows.attributes {
            db.attributes.push(Attribute::from_row(row)?);
        }
        debug!(
            schemas = db.schemas.len(),
            relations = db.relations.len(),
            types = db.types.len(),
            functions = db.functions.len(),
            attributes = db.attributes.len(),
            "catalog snapshot constructed"
        );
        Ok(db)
    }

    /// Look a schema up by name. A miss is an explicit error, never a
    /// silently empty report.
    pub fn schema_by_name(&self, name: &str) -> DocResult<&Arc<Schema>> {
        self.schemas
            .values()
            .find(|s| s.name == name)
            .ok_or_else(|| DocError::not_found("no_schema", format!("no schema named {}", name)))
    }

    /// Relations owned by a schema, name-ascending. An O(n) scan over the
    /// snapshot; catalogs hold hundreds of objects, not millions.
    pub fn relations_in(&self, schema: Oid) -> Vec<&Arc<Relation>> {
        let mut out: Vec<&Arc<Relation>> = self
            .relations
            .values()
            .filter(|r| r.schema.oid() == schema)
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Functions owned by a schema, name-ascending.
    pub fn functions_in(&self, schema: Oid) -> Vec<&Arc<Function>> {
        let mut out: Vec<&Arc<Function>> = self
            .functions
            .values()
            .filter(|f| f.schema.oid() == schema)
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Attributes of a relation ordered by ordinal position ascending,
    /// system columns included (callers filter).
    pub fn attributes_of(&self, relation: Oid) -> Vec<&Attribute> {
        let mut out: Vec<&Attribute> = self
            .attributes
            .iter()
            .filter(|a| a.relation.oid() == relation)
            .collect();
        out.sort_by_key(|a| a.position);
        out
    }
}

impl Schema {
    fn from_row(row: &Row) -> DocResult<Schema> {
        Ok(Schema {
            oid: Oid(row.try_get("oid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }
}

impl Relation {
    fn from_row(row: &Row) -> DocResult<Relation> {
        let kind: String = row.try_get("kind")?;
        Ok(Relation {
            oid: Oid(row.try_get("oid")?),
            schema: LazyRef::new(Oid(row.try_get("namespace")?)),
            name: row.try_get("name")?,
            kind: RelationKind::from_discriminator(&kind),
            description: row.try_get("description")?,
        })
    }
}

impl Attribute {
    fn from_row(row: &Row) -> DocResult<Attribute> {
        Ok(Attribute {
            relation: LazyRef::new(Oid(row.try_get("relation")?)),
            position: row.try_get("position")?,
            name: row.try_get("name")?,
            ty: LazyRef::new(Oid(row.try_get("type")?)),
            description: row.try_get("description")?,
        })
    }
}

impl PgType {
    fn from_row(row: &Row) -> DocResult<PgType> {
        let element: u32 = row.try_get("element")?;
        // A positive element oid marks the row as an array of that element.
        let body = if element > 0 {
            TypeBody::Array { element: LazyRef::new(Oid(element)) }
        } else {
            TypeBody::Scalar
        };
        Ok(PgType {
            oid: Oid(row.try_get("oid")?),
            schema: LazyRef::new(Oid(row.try_get("namespace")?)),
            name: row.try_get("name")?,
            display: row.try_get("display")?,
            body,
        })
    }
}

impl Function {
    fn from_row(row: &Row) -> DocResult<Function> {
        let argtypes: String = row.try_get("argtypes")?;
        let argnames: Option<Vec<String>> = row.try_get("argnames")?;
        Ok(Function {
            oid: Oid(row.try_get("oid")?),
            schema: LazyRef::new(Oid(row.try_get("namespace")?)),
            name: row.try_get("name")?,
            arguments: assemble_arguments(&argtypes, argnames)?,
            result: row.try_get("result")?,
            description: row.try_get("description")?,
        })
    }
}

/// Split the catalog's whitespace-separated argument-type list into oids.
pub fn parse_arg_type_oids(argtypes: &str) -> DocResult<Vec<Oid>> {
    argtypes
        .split_whitespace()
        .map(|tok| {
            tok.parse::<u32>()
                .map(Oid)
                .map_err(|_| DocError::catalog("bad_argtypes", format!("unparsable argument type oid '{}'", tok)))
        })
        .collect()
}

/// Pair argument names with argument-type oids in positional order. A null
/// name list means every argument is unnamed; a short list pads with empty
/// names at the tail.
pub fn assemble_arguments(argtypes: &str, names: Option<Vec<String>>) -> DocResult<Vec<Argument>> {
    let oids = parse_arg_type_oids(argtypes)?;
    let names = names.unwrap_or_default();
    Ok(oids
        .into_iter()
        .enumerate()
        .map(|(i, oid)| Argument {
            name: names.get(i).cloned().unwrap_or_default(),
            ty: LazyRef::new(oid),
        })
        .collect())
}
