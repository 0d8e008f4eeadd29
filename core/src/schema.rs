//! The closed set of sled trees an index is made of.

use crate::{IndexError, Result};
use sled::{Db, Tree};

pub const SCHEMA_VERSION: u32 = 1;

/// Key in the `meta` tree holding the schema version (u32, big-endian).
pub(crate) const VERSION_KEY: &[u8] = b"schema_version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaObject {
    /// term id -> lemma
    Terms,
    /// lemma -> term id; uniqueness index over `Terms`
    TermsByLemma,
    /// posting id -> bincode `PostingRecord`
    Postings,
    /// term id ++ posting id -> document id
    PostingsByTerm,
    /// document id -> number of postings
    IndexedDocuments,
    /// id counters, schema version, last build info
    Meta,
}

impl SchemaObject {
    pub const ALL: [SchemaObject; 6] = [
        SchemaObject::Terms,
        SchemaObject::TermsByLemma,
        SchemaObject::Postings,
        SchemaObject::PostingsByTerm,
        SchemaObject::IndexedDocuments,
        SchemaObject::Meta,
    ];

    pub fn tree_name(self) -> &'static str {
        match self {
            SchemaObject::Terms => "terms",
            SchemaObject::TermsByLemma => "terms_by_lemma",
            SchemaObject::Postings => "postings",
            SchemaObject::PostingsByTerm => "postings_by_term",
            SchemaObject::IndexedDocuments => "indexed_documents",
            SchemaObject::Meta => "meta",
        }
    }

    /// Open the tree, creating it on first use. Safe to call repeatedly.
    pub fn create(self, db: &Db) -> Result<Tree> {
        db.open_tree(self.tree_name())
            .map_err(|source| IndexError::SchemaInitialization { object: self.tree_name(), source })
    }
}

/// Open handles to every schema object.
#[derive(Clone)]
pub(crate) struct Schema {
    pub terms: Tree,
    pub terms_by_lemma: Tree,
    pub postings: Tree,
    pub postings_by_term: Tree,
    pub indexed_documents: Tree,
    pub meta: Tree,
}

impl Schema {
    pub fn ensure(db: &Db) -> Result<Self> {
        let schema = Self {
            terms: SchemaObject::Terms.create(db)?,
            terms_by_lemma: SchemaObject::TermsByLemma.create(db)?,
            postings: SchemaObject::Postings.create(db)?,
            postings_by_term: SchemaObject::PostingsByTerm.create(db)?,
            indexed_documents: SchemaObject::IndexedDocuments.create(db)?,
            meta: SchemaObject::Meta.create(db)?,
        };
        schema.check_version()?;
        Ok(schema)
    }

    fn check_version(&self) -> Result<()> {
        let stored = self
            .meta
            .compare_and_swap(VERSION_KEY, None as Option<&[u8]>, Some(&SCHEMA_VERSION.to_be_bytes()[..]))
            .map_err(|source| IndexError::SchemaInitialization { object: SchemaObject::Meta.tree_name(), source })?;
        match stored {
            Ok(()) => Ok(()),
            Err(cas) => {
                let found = cas
                    .current
                    .as_deref()
                    .and_then(|b| <[u8; 4]>::try_from(b).ok())
                    .map(u32::from_be_bytes)
                    .unwrap_or(0);
                if found == SCHEMA_VERSION {
                    Ok(())
                } else {
                    Err(IndexError::SchemaVersion { found, expected: SCHEMA_VERSION })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_names_are_distinct() {
        let mut names: Vec<_> = SchemaObject::ALL.iter().map(|o| o.tree_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SchemaObject::ALL.len());
    }

    #[test]
    fn ensure_is_idempotent() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Schema::ensure(&db).unwrap();
        Schema::ensure(&db).unwrap();
        for obj in SchemaObject::ALL {
            assert!(db.tree_names().iter().any(|n| &n[..] == obj.tree_name().as_bytes()));
        }
    }

    #[test]
    fn rejects_unknown_version() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let meta = SchemaObject::Meta.create(&db).unwrap();
        meta.insert(VERSION_KEY, &99u32.to_be_bytes()[..]).unwrap();
        assert!(matches!(Schema::ensure(&db), Err(IndexError::SchemaVersion { found: 99, .. })));
    }
}
