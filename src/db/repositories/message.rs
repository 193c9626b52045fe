use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::messages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i32,
    pub text: String,
    pub user_id: i32,
    pub created_at: String,
}

impl From<messages::Model> for Message {
    fn from(model: messages::Model) -> Self {
        Self {
            id: model.id,
            text: model.text,
            user_id: model.user_id,
            created_at: model.created_at,
        }
    }
}

pub struct MessageRepository {
    conn: DatabaseConnection,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a message owned by `user_id`. A missing owner surfaces as a
    /// foreign-key violation from the insert, not as a pre-check.
    pub async fn create(&self, user_id: i32, text: &str) -> Result<Message> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = messages::ActiveModel {
            text: Set(text.to_string()),
            user_id: Set(user_id),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(Message::from(model))
    }

    /// A user's messages, most recent first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Message>> {
        let rows = messages::Entity::find()
            .filter(messages::Column::UserId.eq(user_id))
            .order_by_desc(messages::Column::CreatedAt)
            .order_by_desc(messages::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query messages for user")?;

        Ok(rows.into_iter().map(Message::from).collect())
    }
}
