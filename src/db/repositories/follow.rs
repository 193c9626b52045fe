use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};

use super::user::User;
use crate::entities::{follows, users};

pub struct FollowRepository {
    conn: DatabaseConnection,
}

impl FollowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Record a directed follow edge. Idempotent: a duplicate attempt is
    /// swallowed by `ON CONFLICT DO NOTHING`. A missing follower or target
    /// still surfaces as a foreign-key violation.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        let edge = follows::ActiveModel {
            follower_id: sea_orm::Set(follower_id),
            followed_id: sea_orm::Set(followed_id),
        };

        let result = follows::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([follows::Column::FollowerId, follows::Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the edge if present; deleting a missing edge is a no-op.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        follows::Entity::delete_many()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowedId.eq(followed_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete follow edge")?;

        Ok(())
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let count = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FollowedId.eq(followed_id))
            .count(&self.conn)
            .await
            .context("Failed to query follow edge")?;

        Ok(count > 0)
    }

    /// Users that `user_id` follows.
    pub async fn following(&self, user_id: i32) -> Result<Vec<User>> {
        let followed_ids: Vec<i32> = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to query following edges")?
            .into_iter()
            .map(|edge| edge.followed_id)
            .collect();

        self.users_by_ids(followed_ids).await
    }

    /// Users that follow `user_id`.
    pub async fn followers(&self, user_id: i32) -> Result<Vec<User>> {
        let follower_ids: Vec<i32> = follows::Entity::find()
            .filter(follows::Column::FollowedId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to query follower edges")?
            .into_iter()
            .map(|edge| edge.follower_id)
            .collect();

        self.users_by_ids(follower_ids).await
    }

    async fn users_by_ids(&self, ids: Vec<i32>) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(&self.conn)
            .await
            .context("Failed to query users by ids")?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
