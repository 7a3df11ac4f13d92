//! Store error taxonomy

use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid database path")]
    InvalidDbPath,

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("conversation {0} is closed")]
    ConversationClosed(String),

    #[error("message text is empty")]
    EmptyMessage,

    #[error("a live application already exists for {0}")]
    DuplicateApplication(String),

    #[error("application not found: {0}")]
    ApplicationNotFound(String),

    #[error("application {0} is not approved")]
    ApplicationNotApproved(String),

    #[error("term not found: {0}")]
    TermNotFound(String),

    #[error("term {0} is locked")]
    TermLocked(String),

    #[error("unrecognized {field} value: {value}")]
    UnknownVariant {
        field: &'static str,
        value: String,
    },
}

/// True when the backend rejected a write because a row with the same key
/// already exists. SQLite reports this only through the error text.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}
