use crate::{Lemmatizer, SnowballLemmatizer};
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

/// Lowercase + lemmatize, shared by indexing and querying.
///
/// Output has the same length and order as the input, so repeated tokens stay
/// repeated and posting counts double as term frequencies. A token the
/// lemmatizer refuses is passed through lowercased.
#[derive(Clone)]
pub struct NormalizationPipeline {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl NormalizationPipeline {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { lemmatizer }
    }

    pub fn normalize(&self, token: &str) -> String {
        let lowered = token.nfkc().collect::<String>().to_lowercase();
        match self.lemmatizer.normalize(&lowered) {
            Ok(lemma) => lemma,
            Err(err) => {
                tracing::trace!(token = %lowered, %err, "lemmatizer refused token, passing through");
                lowered
            }
        }
    }

    pub fn normalize_all<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        tokens.iter().map(|t| self.normalize(t.as_ref())).collect()
    }
}

impl Default for NormalizationPipeline {
    fn default() -> Self {
        Self::new(Arc::new(SnowballLemmatizer::default()))
    }
}

impl std::fmt::Debug for NormalizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizationPipeline").finish_non_exhaustive()
    }
}
