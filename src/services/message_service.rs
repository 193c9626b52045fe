//! Domain service for user-owned messages.

use thiserror::Error;

use crate::db::Message;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("User not found: {0}")]
    OwnerNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for MessageError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::SqlErr;

        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => Self::OwnerNotFound(msg),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for MessageError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db_err) = err.downcast_ref::<sea_orm::DbErr>() {
            use sea_orm::SqlErr;
            if let Some(SqlErr::ForeignKeyConstraintViolation(msg)) = db_err.sql_err() {
                return Self::OwnerNotFound(msg);
            }
            return Self::Database(db_err.to_string());
        }
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for messages.
#[async_trait::async_trait]
pub trait MessageService: Send + Sync {
    /// Creates a message owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::OwnerNotFound`] when the owner does not exist
    /// (surfaced from the FK at insert time).
    async fn create(&self, user_id: i32, text: &str) -> Result<Message, MessageError>;

    /// The owner's messages, most recent first.
    async fn for_user(&self, user_id: i32) -> Result<Vec<Message>, MessageError>;
}
