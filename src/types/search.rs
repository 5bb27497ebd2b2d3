use serde::{Deserialize, Serialize};

use crate::types::DocumentId;

/// One matching chunk from a document search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Text of the matching chunk.
    pub chunk_text: String,

    /// Position of the chunk within its document.
    pub chunk_index: u32,

    /// Similarity between the query and the chunk.
    #[serde(default)]
    pub similarity_score: f64,

    /// Document the chunk was cut from.
    pub document_id: DocumentId,
}

/// Body returned by the search endpoint, best match first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching chunks.
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

impl SearchResponse {
    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
