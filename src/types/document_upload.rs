use serde::{Deserialize, Serialize};

use crate::types::DocumentId;

/// Body returned after a document has been stored and split into chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUploadResponse {
    /// Status line from the backend.
    pub message: String,

    /// Identifier of the stored document.
    pub document_id: DocumentId,

    /// Number of searchable chunks created from the document.
    pub chunks_created: u32,
}
