pub mod builder;
pub mod config;
pub mod docstore;
pub mod error;
pub mod index;
pub mod lemmatizer;
pub mod normalize;
pub mod persist;
pub mod query;
pub mod schema;
pub mod tokenizer;

pub use builder::{BuildOutcome, IndexBuilder};
pub use config::{IndexConfig, Language, ReindexPolicy};
pub use docstore::{DocumentSource, DocumentStore};
pub use error::{IndexError, Result};
pub use index::{BuildInfo, DocId, Document, IndexStats, PostingId, PostingRecord, SearchHit, TermId};
pub use lemmatizer::{LemmatizeError, Lemmatizer, SnowballLemmatizer};
pub use normalize::NormalizationPipeline;
pub use persist::IndexStore;
pub use query::QueryEngine;
