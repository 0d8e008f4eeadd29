use crate::tokenizer::tokenize;
use crate::{DocId, IndexStore, NormalizationPipeline, Result, SearchHit};
use std::sync::Arc;

/// Read side of the index. Query words go through the same
/// [`NormalizationPipeline`] the builder used, otherwise inflected forms
/// would never meet their stored lemmas.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<IndexStore>,
    pipeline: NormalizationPipeline,
}

impl QueryEngine {
    pub fn new(store: Arc<IndexStore>, pipeline: NormalizationPipeline) -> Self {
        Self { store, pipeline }
    }

    pub fn search<S: AsRef<str>>(&self, raw_query: &[S]) -> Result<Vec<(DocId, u64)>> {
        let words: Vec<&str> = raw_query.iter().map(|w| w.as_ref().trim()).filter(|w| !w.is_empty()).collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let lemmas = self.pipeline.normalize_all(&words);
        tracing::debug!(?lemmas, "search");
        self.store.lookup_documents(&lemmas)
    }

    /// Tokenize free text, then [`search`](Self::search).
    pub fn search_text(&self, query: &str) -> Result<Vec<SearchHit>> {
        let hits = self.search(&tokenize(query))?;
        Ok(hits.into_iter().map(SearchHit::from).collect())
    }
}
