use serde::{Deserialize, Serialize};

pub type TermId = u64;
pub type DocId = u64;
pub type PostingId = u64;

/// A record read from the document store. Only `title` and `description` are indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { id, title: title.into(), description: description.into(), path: None }
    }

    /// Title and description joined by a single space.
    pub fn indexable_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Value stored in the `postings` tree: one row per lemma occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRecord {
    pub term_id: TermId,
    pub document_id: DocId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: DocId,
    pub match_count: u64,
}

impl From<(DocId, u64)> for SearchHit {
    fn from((document_id, match_count): (DocId, u64)) -> Self {
        Self { document_id, match_count }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub terms: usize,
    pub postings: usize,
    pub documents: usize,
}

/// Summary of the last build pass, kept in the `meta` tree as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub built_at: String,
    pub documents: u64,
    pub postings: u64,
    pub version: u32,
}
