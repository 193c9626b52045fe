//! Domain service for accounts and follow relationships.
//!
//! Handles signup, credential verification, and the directed follow graph.

use thiserror::Error;

use crate::db::{NewUser, User};

/// Errors specific to user operations.
///
/// Integrity failures are classified from the database error the failed
/// commit produced; signup never pre-validates uniqueness.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        classify_db_err(&err).unwrap_or_else(|| Self::Database(err.to_string()))
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db_err) = err.downcast_ref::<sea_orm::DbErr>() {
            if let Some(classified) = classify_db_err(db_err) {
                return classified;
            }
            return Self::Database(db_err.to_string());
        }
        Self::Internal(err.to_string())
    }
}

fn classify_db_err(err: &sea_orm::DbErr) -> Option<UserError> {
    use sea_orm::SqlErr;

    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(UserError::Constraint(msg)),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => Some(UserError::NotFound(msg)),
        _ => {
            // SQLite reports NOT NULL and CHECK failures as plain execution
            // errors; they are still integrity-class failures to callers.
            let msg = err.to_string();
            if msg.contains("constraint") {
                Some(UserError::Constraint(msg))
            } else {
                None
            }
        }
    }
}

/// Domain service trait for accounts and the follow graph.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates an account, hashing the credential before persisting.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Constraint`] when the commit fails on a duplicate
    /// username/email or an empty required field.
    async fn signup(&self, new_user: NewUser) -> Result<User, UserError>;

    /// Verifies credentials. Failure is a value, not an error: `None` covers
    /// both an unknown username and a wrong password.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserError>;

    async fn get_user(&self, id: i32) -> Result<User, UserError>;

    /// Updates a user's bio text.
    async fn update_bio(&self, id: i32, bio: Option<&str>) -> Result<User, UserError>;

    /// Records a follow edge, idempotently.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for a self-follow and
    /// [`UserError::NotFound`] when the target does not exist.
    async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<(), UserError>;

    /// Removes a follow edge; no-op when absent.
    async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<(), UserError>;

    async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool, UserError>;

    async fn is_followed_by(&self, user_id: i32, follower_id: i32) -> Result<bool, UserError>;

    /// Users that `user_id` follows.
    async fn following(&self, user_id: i32) -> Result<Vec<User>, UserError>;

    /// Users following `user_id`.
    async fn followers(&self, user_id: i32) -> Result<Vec<User>, UserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_err_without_constraint_maps_to_database() {
        let err = sea_orm::DbErr::Custom("boom".to_string());
        let user_err: UserError = err.into();
        assert!(matches!(user_err, UserError::Database(_)));
    }

    #[test]
    fn check_failure_maps_to_constraint() {
        let err = sea_orm::DbErr::Custom("CHECK constraint failed: users".to_string());
        let user_err: UserError = err.into();
        assert!(matches!(user_err, UserError::Constraint(_)));
    }

    #[test]
    fn non_db_anyhow_maps_to_internal() {
        let err = anyhow::anyhow!("task panicked");
        let user_err: UserError = err.into();
        assert!(matches!(user_err, UserError::Internal(_)));
    }
}
