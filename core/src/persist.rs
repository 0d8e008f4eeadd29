//! sled-backed storage for the term dictionary and the posting list.

use crate::schema::{Schema, SchemaObject};
use crate::{BuildInfo, DocId, IndexConfig, IndexError, IndexStats, PostingId, PostingRecord, Result, TermId};
use parking_lot::RwLock;
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionalTree};
use sled::{Db, Transactional};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

const NEXT_TERM_ID: &[u8] = b"next_term_id";
const NEXT_POSTING_ID: &[u8] = b"next_posting_id";
const BUILD_INFO: &[u8] = b"build_info";

type TxResult<T> = ConflictableTransactionResult<T, IndexError>;

fn decode_u64(bytes: &[u8]) -> Option<u64> {
    <[u8; 8]>::try_from(bytes).ok().map(u64::from_be_bytes)
}

fn corrupt(object: SchemaObject, detail: impl Into<String>) -> IndexError {
    IndexError::CorruptRecord { tree: object.tree_name(), detail: detail.into() }
}

fn abort<T>(err: IndexError) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(err))
}

/// `postings_by_term` key: term id then posting id, both big-endian, so a
/// prefix scan on the term id yields its postings in insertion order.
fn posting_key(term_id: TermId, posting_id: PostingId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&term_id.to_be_bytes());
    key[8..].copy_from_slice(&posting_id.to_be_bytes());
    key
}

/// Reserve `count` consecutive ids from the counter under `key`, returning the first.
fn reserve_ids(meta: &TransactionalTree, key: &[u8], count: u64) -> TxResult<u64> {
    let first = match meta.get(key)? {
        Some(v) => match decode_u64(&v) {
            Some(n) => n,
            None => return abort(corrupt(SchemaObject::Meta, "id counter is not a u64")),
        },
        None => 1,
    };
    meta.insert(key, &(first + count).to_be_bytes()[..])?;
    Ok(first)
}

fn intern_in(terms: &TransactionalTree, by_lemma: &TransactionalTree, meta: &TransactionalTree, lemma: &str) -> TxResult<TermId> {
    if let Some(v) = by_lemma.get(lemma.as_bytes())? {
        return match decode_u64(&v) {
            Some(id) => Ok(id),
            None => abort(corrupt(SchemaObject::TermsByLemma, format!("bad term id for {lemma:?}"))),
        };
    }
    let id = reserve_ids(meta, NEXT_TERM_ID, 1)?;
    by_lemma.insert(lemma.as_bytes(), &id.to_be_bytes()[..])?;
    terms.insert(&id.to_be_bytes()[..], lemma.as_bytes())?;
    Ok(id)
}

/// The inverted index: a deduplicated term dictionary plus one posting per
/// lemma occurrence.
///
/// Writers are serialized by an internal lock and each write runs in a single
/// sled transaction, so readers never see half of a document's postings.
pub struct IndexStore {
    db: Db,
    schema: Schema,
    write_lock: RwLock<()>,
}

impl IndexStore {
    pub fn open(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let db = config
            .sled_config(&config.index_path)
            .open()
            .map_err(|source| IndexError::SchemaInitialization { object: "database", source })?;
        Self::from_db(db)
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|source| IndexError::SchemaInitialization { object: "database", source })?;
        Self::from_db(db)
    }

    pub fn temporary() -> Result<Self> {
        Self::open(&IndexConfig::temporary())
    }

    pub fn from_db(db: Db) -> Result<Self> {
        let schema = Schema::ensure(&db)?;
        tracing::debug!(terms = schema.terms.len(), postings = schema.postings.len(), "index store opened");
        Ok(Self { db, schema, write_lock: RwLock::new(()) })
    }

    /// Create any missing tree and verify the schema version. No-op when the
    /// schema is already in place.
    pub fn ensure_schema(&self) -> Result<()> {
        Schema::ensure(&self.db).map(|_| ())
    }

    /// Insert-or-ignore every lemma and return the ids of all of them.
    pub fn intern_terms(&self, lemmas: &BTreeSet<String>) -> Result<HashMap<String, TermId>> {
        if lemmas.is_empty() {
            return Ok(HashMap::new());
        }
        let _guard = self.write_lock.write();
        let s = &self.schema;
        let ids = (&s.terms, &s.terms_by_lemma, &s.meta).transaction(|(terms, by_lemma, meta)| -> TxResult<HashMap<String, TermId>> {
            let mut ids = HashMap::with_capacity(lemmas.len());
            for lemma in lemmas {
                ids.insert(lemma.clone(), intern_in(terms, by_lemma, meta, lemma)?);
            }
            Ok(ids)
        })?;
        Ok(ids)
    }

    /// Append one posting per lemma occurrence for `document_id`, duplicates
    /// included. The whole document is written atomically.
    pub fn append_postings<S: AsRef<str>>(&self, document_id: DocId, lemmas: &[S]) -> Result<usize> {
        if lemmas.is_empty() {
            return Ok(0);
        }
        let count = lemmas.len() as u64;
        let _guard = self.write_lock.write();
        let s = &self.schema;
        let trees = (&s.terms, &s.terms_by_lemma, &s.postings, &s.postings_by_term, &s.indexed_documents, &s.meta);
        trees.transaction(|(terms, by_lemma, postings, by_term, docs, meta)| -> TxResult<()> {
            let mut term_ids: HashMap<&str, TermId> = HashMap::new();
            let first_posting = reserve_ids(meta, NEXT_POSTING_ID, count)?;
            for (offset, lemma) in lemmas.iter().enumerate() {
                let lemma = lemma.as_ref();
                let term_id = match term_ids.get(lemma) {
                    Some(&id) => id,
                    None => {
                        let id = intern_in(terms, by_lemma, meta, lemma)?;
                        term_ids.insert(lemma, id);
                        id
                    }
                };
                let posting_id = first_posting + offset as u64;
                let record = match bincode::serialize(&PostingRecord { term_id, document_id }) {
                    Ok(bytes) => bytes,
                    Err(e) => return abort(IndexError::Encoding(e)),
                };
                postings.insert(&posting_id.to_be_bytes()[..], record)?;
                by_term.insert(&posting_key(term_id, posting_id)[..], &document_id.to_be_bytes()[..])?;
            }
            let doc_key = document_id.to_be_bytes();
            let previous = match docs.get(&doc_key[..])? {
                Some(v) => match decode_u64(&v) {
                    Some(n) => n,
                    None => return abort(corrupt(SchemaObject::IndexedDocuments, format!("bad count for document {document_id}"))),
                },
                None => 0,
            };
            docs.insert(&doc_key[..], &(previous + count).to_be_bytes()[..])?;
            Ok(())
        })?;
        tracing::trace!(document_id, postings = count, "appended postings");
        Ok(lemmas.len())
    }

    /// Documents holding at least one posting for any of `query_lemmas`, with
    /// the number of matching postings. Repeated query lemmas count once.
    /// Sorted by match count descending, then document id ascending.
    pub fn lookup_documents<S: AsRef<str>>(&self, query_lemmas: &[S]) -> Result<Vec<(DocId, u64)>> {
        let unique: BTreeSet<&str> = query_lemmas.iter().map(|l| l.as_ref()).collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        let _guard = self.write_lock.read();
        let mut counts: HashMap<DocId, u64> = HashMap::new();
        for lemma in unique {
            let Some(term_id) = self.term_id(lemma)? else {
                continue;
            };
            for entry in self.schema.postings_by_term.scan_prefix(term_id.to_be_bytes()) {
                let (_, value) = entry?;
                let doc = decode_u64(&value).ok_or_else(|| corrupt(SchemaObject::PostingsByTerm, "document id is not a u64"))?;
                *counts.entry(doc).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(DocId, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(ranked)
    }

    pub fn term_id(&self, lemma: &str) -> Result<Option<TermId>> {
        match self.schema.terms_by_lemma.get(lemma.as_bytes())? {
            Some(v) => decode_u64(&v)
                .map(Some)
                .ok_or_else(|| corrupt(SchemaObject::TermsByLemma, format!("bad term id for {lemma:?}"))),
            None => Ok(None),
        }
    }

    pub fn lemma(&self, term_id: TermId) -> Result<Option<String>> {
        match self.schema.terms.get(term_id.to_be_bytes())? {
            Some(v) => String::from_utf8(v.to_vec())
                .map(Some)
                .map_err(|e| corrupt(SchemaObject::Terms, e.to_string())),
            None => Ok(None),
        }
    }

    /// Every posting row in id order.
    pub fn postings(&self) -> Result<Vec<(PostingId, PostingRecord)>> {
        let _guard = self.write_lock.read();
        let mut out = Vec::new();
        for entry in self.schema.postings.iter() {
            let (key, value) = entry?;
            let id = decode_u64(&key).ok_or_else(|| corrupt(SchemaObject::Postings, "posting id is not a u64"))?;
            out.push((id, bincode::deserialize(&value)?));
        }
        Ok(out)
    }

    pub fn is_indexed(&self) -> bool {
        !self.schema.indexed_documents.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let _guard = self.write_lock.read();
        IndexStats {
            terms: self.schema.terms.len(),
            postings: self.schema.postings.len(),
            documents: self.schema.indexed_documents.len(),
        }
    }

    /// Drop every posting. Terms and id counters are left alone.
    pub fn clear_postings(&self) -> Result<()> {
        let _guard = self.write_lock.write();
        self.schema.postings.clear()?;
        self.schema.postings_by_term.clear()?;
        self.schema.indexed_documents.clear()?;
        tracing::info!("cleared postings");
        Ok(())
    }

    pub fn build_info(&self) -> Result<Option<BuildInfo>> {
        match self.schema.meta.get(BUILD_INFO)? {
            Some(v) => Ok(Some(serde_json::from_slice(&v)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn record_build(&self, info: &BuildInfo) -> Result<()> {
        let json = serde_json::to_vec(info)?;
        self.schema.meta.insert(BUILD_INFO, json)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn meta_tree(&self) -> &sled::Tree {
        &self.schema.meta
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore").field("stats", &self.stats()).finish()
    }
}
