//! `SeaORM` implementation of the `MessageService` trait.

use async_trait::async_trait;

use crate::db::{Message, Store};
use crate::services::message_service::{MessageError, MessageService};

pub struct SeaOrmMessageService {
    store: Store,
}

impl SeaOrmMessageService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MessageService for SeaOrmMessageService {
    async fn create(&self, user_id: i32, text: &str) -> Result<Message, MessageError> {
        if text.trim().is_empty() {
            return Err(MessageError::Validation(
                "Message text cannot be empty".to_string(),
            ));
        }

        let message = self.store.create_message(user_id, text).await?;

        tracing::debug!(message_id = message.id, user_id, "Message created");
        Ok(message)
    }

    async fn for_user(&self, user_id: i32) -> Result<Vec<Message>, MessageError> {
        let messages = self.store.messages_for_user(user_id).await?;
        Ok(messages)
    }
}
