use aula_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message text is empty")]
    EmptyMessage,

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("conversation {0} is closed")]
    ConversationClosed(String),

    #[error("storage error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmptyMessage => ChatError::EmptyMessage,
            StoreError::ConversationNotFound(id) => ChatError::ConversationNotFound(id),
            StoreError::ConversationClosed(id) => ChatError::ConversationClosed(id),
            other => ChatError::Store(other),
        }
    }
}
