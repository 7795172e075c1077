//!
//! pgdoc lazy references
//! ---------------------
//! A [`LazyRef`] stands in for a cross-reference between catalog entities.
//! It holds only the target oid at construction time; the first `resolve`
//! call looks the entity up in the snapshot's map for the reference's kind,
//! caches the result, and every later call returns the cached entity without
//! touching the map again. Resolution failure (the oid is absent from the
//! snapshot) is an explicit error at first use, never a silent placeholder:
//! the snapshot is assumed internally consistent and a dangling reference
//! means catalog corruption worth surfacing loudly.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{DocError, DocResult};
use crate::model::{Database, Oid, PgType, Relation, Schema};

/// An entity kind that can be looked up by oid in the snapshot.
pub trait CatalogEntity: Sized {
    /// Kind label used in dangling-reference error messages.
    const KIND: &'static str;

    fn lookup<'db>(db: &'db Database, oid: Oid) -> Option<&'db Arc<Self>>;
}

impl CatalogEntity for Schema {
    const KIND: &'static str = "schema";

    fn lookup<'db>(db: &'db Database, oid: Oid) -> Option<&'db Arc<Self>> {
        db.schemas.get(&oid)
    }
}

impl CatalogEntity for Relation {
    const KIND: &'static str = "relation";

    fn lookup<'db>(db: &'db Database, oid: Oid) -> Option<&'db Arc<Self>> {
        db.relations.get(&oid)
    }
}

impl CatalogEntity for PgType {
    const KIND: &'static str = "type";

    fn lookup<'db>(db: &'db Database, oid: Oid) -> Option<&'db Arc<Self>> {
        db.types.get(&oid)
    }
}

/// Deferred-resolution pointer to a catalog entity by oid.
///
/// Two observable states: unresolved (only the oid is known) and resolved
/// (the entity is cached). Callers go through [`LazyRef::resolve`] before
/// reading entity fields; the map lookup runs at most once per reference
/// instance.
#[derive(Debug)]
pub struct LazyRef<T> {
    oid: Oid,
    cell: OnceCell<Arc<T>>,
}

impl<T: CatalogEntity> LazyRef<T> {
    pub fn new(oid: Oid) -> Self {
        LazyRef { oid, cell: OnceCell::new() }
    }

    /// Target oid. Readable without triggering resolution.
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Resolve the target entity against the snapshot, caching on first use.
    pub fn resolve<'a>(&'a self, db: &Database) -> DocResult<&'a T> {
        let arc = self.cell.get_or_try_init(|| {
            T::lookup(db, self.oid).cloned().ok_or_else(|| {
                DocError::reference(
                    "dangling_ref",
                    format!("no {} with oid {} in catalog snapshot", T::KIND, self.oid),
                )
            })
        })?;
        Ok(arc.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_schema(oid: u32, name: &str) -> Database {
        let mut db = Database::default();
        db.schemas.insert(
            Oid(oid),
            Arc::new(Schema { oid: Oid(oid), name: name.into(), description: None }),
        );
        db
    }

    #[test]
    fn resolves_to_target_entity() {
        let db = snapshot_with_schema(11, "public");
        let r: LazyRef<Schema> = LazyRef::new(Oid(11));
        assert_eq!(r.oid(), Oid(11));
        assert_eq!(r.resolve(&db).expect("resolve failed").name, "public");
    }

    #[test]
    fn second_resolve_returns_cached_entity() {
        let db = snapshot_with_schema(11, "public");
        let r: LazyRef<Schema> = LazyRef::new(Oid(11));
        let first = r.resolve(&db).expect("first resolve failed");
        let second = r.resolve(&db).expect("second resolve failed");
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn lookup_runs_at_most_once() {
        let mut db = snapshot_with_schema(11, "public");
        let r: LazyRef<Schema> = LazyRef::new(Oid(11));
        r.resolve(&db).expect("first resolve failed");
        // Emptying the map after the first resolve must not matter: the
        // reference no longer consults it.
        db.schemas.clear();
        assert_eq!(r.resolve(&db).expect("cached resolve failed").name, "public");
    }

    #[test]
    fn dangling_reference_fails_at_first_use() {
        let db = snapshot_with_schema(11, "public");
        let r: LazyRef<Schema> = LazyRef::new(Oid(999));
        let err = r.resolve(&db).expect_err("expected dangling failure");
        assert_eq!(err.code_str(), "dangling_ref");
        assert!(err.message().contains("schema"));
        assert!(err.message().contains("999"));
    }

    #[test]
    fn kind_selects_the_right_mapping() {
        let mut db = snapshot_with_schema(11, "public");
        db.types.insert(
            Oid(11),
            Arc::new(PgType {
                oid: Oid(11),
                schema: LazyRef::new(Oid(11)),
                name: "custom".into(),
                display: "public.custom".into(),
                body: crate::model::TypeBody::Scalar,
            }),
        );
        // Same oid, different kind, different mapping.
        let sref: LazyRef<Schema> = LazyRef::new(Oid(11));
        let tref: LazyRef<PgType> = LazyRef::new(Oid(11));
        assert_eq!(sref.resolve(&db).unwrap().name, "public");
        assert_eq!(tref.resolve(&db).unwrap().name, "custom");
    }
}
