//! Document records the index is built from.

use crate::{DocId, Document, IndexConfig, IndexError, Result};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult};
use sled::{Db, Transactional, Tree};
use std::path::Path;

const NEXT_DOC_ID: &[u8] = b"next_doc_id";

/// Anything that can hand the builder its `(id, title, description)` records.
pub trait DocumentSource {
    fn list_documents(&self) -> Result<Vec<Document>>;
}

impl DocumentSource for Vec<Document> {
    fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    title: String,
    description: String,
    path: Option<String>,
}

/// sled-backed document table: auto-assigned ids, unique titles.
pub struct DocumentStore {
    db: Db,
    documents: Tree,
    titles: Tree,
    meta: Tree,
}

impl DocumentStore {
    pub fn open(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let db = config
            .sled_config(&config.docs_path)
            .open()
            .map_err(|source| IndexError::SchemaInitialization { object: "documents database", source })?;
        Self::from_db(db)
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|source| IndexError::SchemaInitialization { object: "documents database", source })?;
        Self::from_db(db)
    }

    pub fn temporary() -> Result<Self> {
        Self::open(&IndexConfig::temporary())
    }

    pub fn from_db(db: Db) -> Result<Self> {
        let open = |name: &'static str| {
            db.open_tree(name).map_err(|source| IndexError::SchemaInitialization { object: name, source })
        };
        let documents = open("documents")?;
        let titles = open("document_titles")?;
        let meta = open("documents_meta")?;
        Ok(Self { db, documents, titles, meta })
    }

    /// Store a new document and return its id. Titles must be unique.
    pub fn insert(&self, title: &str, description: &str, path: Option<&str>) -> Result<DocId> {
        let record = bincode::serialize(&StoredDocument {
            title: title.to_string(),
            description: description.to_string(),
            path: path.map(str::to_string),
        })?;
        let id = (&self.documents, &self.titles, &self.meta).transaction(
            |(documents, titles, meta)| -> ConflictableTransactionResult<DocId, IndexError> {
                if let Some(existing) = titles.get(title.as_bytes())? {
                    let err = match decode_id(&existing) {
                        Some(existing) => IndexError::DuplicateTitle { title: title.to_string(), existing },
                        None => corrupt("document_titles", format!("bad document id for title {title:?}")),
                    };
                    return Err(ConflictableTransactionError::Abort(err));
                }
                let id = match meta.get(NEXT_DOC_ID)? {
                    Some(v) => match decode_id(&v) {
                        Some(id) => id,
                        None => {
                            return Err(ConflictableTransactionError::Abort(corrupt(
                                "documents_meta",
                                "document id counter is not a u64",
                            )))
                        }
                    },
                    None => 1,
                };
                meta.insert(NEXT_DOC_ID, &(id + 1).to_be_bytes()[..])?;
                titles.insert(title.as_bytes(), &id.to_be_bytes()[..])?;
                documents.insert(&id.to_be_bytes()[..], record.clone())?;
                Ok(id)
            },
        )?;
        tracing::debug!(doc_id = id, title, "stored document");
        Ok(id)
    }

    pub fn get(&self, id: DocId) -> Result<Option<Document>> {
        match self.documents.get(id.to_be_bytes())? {
            Some(v) => Ok(Some(to_document(id, bincode::deserialize(&v)?))),
            None => Ok(None),
        }
    }

    /// Delete a document. Postings already built for it stay in the index
    /// until the next rebuild.
    pub fn remove(&self, id: DocId) -> Result<Option<Document>> {
        let key = id.to_be_bytes();
        let removed = (&self.documents, &self.titles).transaction(
            |(documents, titles)| -> ConflictableTransactionResult<Option<sled::IVec>, IndexError> {
                let Some(value) = documents.remove(&key[..])? else {
                    return Ok(None);
                };
                let stored: StoredDocument = bincode::deserialize(&value)
                    .map_err(|e| ConflictableTransactionError::Abort(IndexError::Encoding(e)))?;
                titles.remove(stored.title.as_bytes())?;
                Ok(Some(value))
            },
        )?;
        match removed {
            Some(v) => Ok(Some(to_document(id, bincode::deserialize(&v)?))),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl DocumentSource for DocumentStore {
    fn list_documents(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::with_capacity(self.documents.len());
        for entry in self.documents.iter() {
            let (key, value) = entry?;
            let id = decode_id(&key).ok_or_else(|| corrupt("documents", "document id is not a u64"))?;
            docs.push(to_document(id, bincode::deserialize(&value)?));
        }
        Ok(docs)
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").field("documents", &self.documents.len()).finish()
    }
}

fn decode_id(bytes: &[u8]) -> Option<DocId> {
    <[u8; 8]>::try_from(bytes).ok().map(DocId::from_be_bytes)
}

fn corrupt(tree: &'static str, detail: impl Into<String>) -> IndexError {
    IndexError::CorruptRecord { tree, detail: detail.into() }
}

fn to_document(id: DocId, stored: StoredDocument) -> Document {
    Document { id, title: stored.title, description: stored.description, path: stored.path }
}
