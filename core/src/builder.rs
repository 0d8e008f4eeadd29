use crate::schema::SCHEMA_VERSION;
use crate::tokenizer::tokenize;
use crate::{BuildInfo, Document, DocumentSource, IndexError, IndexStore, NormalizationPipeline, ReindexPolicy, Result};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Indexed { documents: usize, postings: u64 },
    /// The document source yielded nothing; the index was left untouched.
    Empty,
}

/// Feeds documents through tokenizer and normalization into an [`IndexStore`].
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    store: Arc<IndexStore>,
    pipeline: NormalizationPipeline,
    policy: ReindexPolicy,
}

impl IndexBuilder {
    pub fn new(store: Arc<IndexStore>, pipeline: NormalizationPipeline) -> Self {
        Self { store, pipeline, policy: ReindexPolicy::default() }
    }

    pub fn with_policy(mut self, policy: ReindexPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Lemmas of `title + " " + description`, one per token occurrence.
    pub fn document_lemmas(&self, doc: &Document) -> Vec<String> {
        self.pipeline.normalize_all(&tokenize(&doc.indexable_text()))
    }

    pub fn build_from(&self, source: &dyn DocumentSource) -> Result<BuildOutcome> {
        self.build_index(source.list_documents()?)
    }

    pub fn build_index<I>(&self, documents: I) -> Result<BuildOutcome>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut documents = documents.into_iter().peekable();
        if documents.peek().is_none() {
            tracing::info!("no documents to index");
            return Ok(BuildOutcome::Empty);
        }

        if self.store.is_indexed() {
            match self.policy {
                ReindexPolicy::Reject => {
                    let documents = self.store.stats().documents;
                    return Err(IndexError::AlreadyIndexed { documents });
                }
                ReindexPolicy::Rebuild => self.store.clear_postings()?,
                ReindexPolicy::Append => tracing::warn!("appending to an existing index, match counts will grow"),
            }
        }

        let mut indexed = 0usize;
        let mut postings = 0u64;
        for doc in documents {
            let lemmas = self.document_lemmas(&doc);
            let appended = match self.store.append_postings(doc.id, &lemmas) {
                Ok(n) => n,
                Err(err) => {
                    tracing::error!(
                        doc_id = doc.id,
                        indexed,
                        policy = ?self.policy,
                        %err,
                        "build aborted, index holds only the documents before this one"
                    );
                    return Err(err);
                }
            };
            postings += appended as u64;
            indexed += 1;
            tracing::debug!(doc_id = doc.id, lemmas = lemmas.len(), "indexed document");
        }

        let info = BuildInfo {
            built_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
            documents: indexed as u64,
            postings,
            version: SCHEMA_VERSION,
        };
        self.store.record_build(&info)?;
        self.store.flush()?;
        tracing::info!(documents = indexed, postings, "index build complete");
        Ok(BuildOutcome::Indexed { documents: indexed, postings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(policy: ReindexPolicy) -> (Arc<IndexStore>, IndexBuilder) {
        let store = Arc::new(IndexStore::temporary().unwrap());
        let builder = IndexBuilder::new(Arc::clone(&store), NormalizationPipeline::default()).with_policy(policy);
        (store, builder)
    }

    fn docs() -> Vec<Document> {
        vec![Document::new(1, "Фотография слона", "слона видели в Африке")]
    }

    #[test]
    fn empty_source_is_a_no_op() {
        let (store, b) = builder(ReindexPolicy::Reject);
        assert_eq!(b.build_index(Vec::new()).unwrap(), BuildOutcome::Empty);
        assert!(store.build_info().unwrap().is_none());
    }

    #[test]
    fn rebuild_does_not_inflate_counts() {
        let (store, b) = builder(ReindexPolicy::Rebuild);
        b.build_index(docs()).unwrap();
        b.build_index(docs()).unwrap();
        assert_eq!(store.lookup_documents(&["слон"]).unwrap(), vec![(1, 2)]);
    }

    #[test]
    fn append_doubles_counts() {
        let (store, b) = builder(ReindexPolicy::Append);
        b.build_index(docs()).unwrap();
        b.build_index(docs()).unwrap();
        assert_eq!(store.lookup_documents(&["слон"]).unwrap(), vec![(1, 4)]);
    }

    #[test]
    fn failed_rebuild_leaves_earlier_documents_only() {
        let (store, b) = builder(ReindexPolicy::Rebuild);
        b.build_index(docs()).unwrap();
        let before = store.build_info().unwrap();
        store.meta_tree().insert(b"next_posting_id", &b"bad"[..]).unwrap();
        let more = vec![Document::new(2, "Слоны", "стадо"), Document::new(3, "Дятел", "вуди")];
        assert!(matches!(b.build_index(more), Err(IndexError::CorruptRecord { tree: "meta", .. })));
        assert_eq!(store.stats().documents, 0);
        assert_eq!(store.build_info().unwrap(), before);
    }

    #[test]
    fn reject_refuses_second_build() {
        let (_store, b) = builder(ReindexPolicy::Reject);
        assert_eq!(b.build_index(docs()).unwrap(), BuildOutcome::Indexed { documents: 1, postings: 5 });
        assert!(matches!(b.build_index(docs()), Err(IndexError::AlreadyIndexed { documents: 1 })));
    }
}
