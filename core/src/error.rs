use crate::DocId;
use thiserror::Error;

pub type Result<T, E = IndexError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum IndexError {
    /// The persistence layer could not create or open the index relations.
    #[error("schema initialization failed for `{object}`: {source}")]
    SchemaInitialization {
        object: &'static str,
        #[source]
        source: sled::Error,
    },
    #[error("index schema version {found} is not supported (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt record in `{tree}`: {detail}")]
    CorruptRecord { tree: &'static str, detail: String },
    #[error("index already holds postings for {documents} documents")]
    AlreadyIndexed { documents: usize },
    #[error("document title already exists: {title:?} (id {existing})")]
    DuplicateTitle { title: String, existing: DocId },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sled::transaction::TransactionError<IndexError>> for IndexError {
    fn from(err: sled::transaction::TransactionError<IndexError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(e) => e,
            sled::transaction::TransactionError::Storage(e) => IndexError::Storage(e),
        }
    }
}
