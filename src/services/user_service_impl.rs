//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User};
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn signup(&self, new_user: NewUser) -> Result<User, UserError> {
        let user = self
            .store
            .signup_user(new_user, Some(&self.security))
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "New user signed up");
        Ok(user)
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        let user = self.store.authenticate_user(username, password).await?;
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> Result<User, UserError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("user {id}")))
    }

    async fn update_bio(&self, id: i32, bio: Option<&str>) -> Result<User, UserError> {
        let user = self.store.update_user_bio(id, bio).await?;
        Ok(user)
    }

    async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<(), UserError> {
        if follower_id == followed_id {
            return Err(UserError::Validation(
                "Cannot follow yourself".to_string(),
            ));
        }

        // The target must exist; the edge insert would also trip the FK, but
        // this gives the caller a proper not-found instead of a raw violation.
        if self.store.get_user(followed_id).await?.is_none() {
            return Err(UserError::NotFound(format!("user {followed_id}")));
        }

        self.store.follow(follower_id, followed_id).await?;
        Ok(())
    }

    async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<(), UserError> {
        self.store.unfollow(follower_id, followed_id).await?;
        Ok(())
    }

    async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool, UserError> {
        let result = self.store.is_following(follower_id, followed_id).await?;
        Ok(result)
    }

    async fn is_followed_by(&self, user_id: i32, follower_id: i32) -> Result<bool, UserError> {
        let result = self.store.is_following(follower_id, user_id).await?;
        Ok(result)
    }

    async fn following(&self, user_id: i32) -> Result<Vec<User>, UserError> {
        let users = self.store.following(user_id).await?;
        Ok(users)
    }

    async fn followers(&self, user_id: i32) -> Result<Vec<User>, UserError> {
        let users = self.store.followers(user_id).await?;
        Ok(users)
    }
}
