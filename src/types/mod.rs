// Public modules
pub mod auth_session;
pub mod chat_response;
pub mod credentials;
pub mod document_id;
pub mod document_upload;
pub mod message;
pub mod message_list;
pub mod search;
pub mod session_id;
pub mod session_info;

// Re-exports
pub use auth_session::{AuthSession, AuthUser};
pub use chat_response::ChatResponse;
pub use credentials::Credentials;
pub use document_id::DocumentId;
pub use document_upload::DocumentUploadResponse;
pub use message::{Message, MessageRole};
pub use message_list::MessageListResponse;
pub use search::{SearchResponse, SearchResult};
pub use session_id::SessionId;
pub use session_info::SessionInfo;
