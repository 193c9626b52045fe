use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{follows, messages, users};

pub mod migrator;
pub mod repositories;

pub use repositories::message::Message;
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // An in-memory database exists per connection, so the pool must be
        // pinned to a single connection that never gets recycled.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn message_repo(&self) -> repositories::message::MessageRepository {
        repositories::message::MessageRepository::new(self.conn.clone())
    }

    fn follow_repo(&self) -> repositories::follow::FollowRepository {
        repositories::follow::FollowRepository::new(self.conn.clone())
    }

    pub async fn signup_user(
        &self,
        new_user: NewUser,
        security: Option<&SecurityConfig>,
    ) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_with_password(&self, username: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_username_with_password(username).await
    }

    pub async fn authenticate_user(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().authenticate(username, password).await
    }

    pub async fn update_user_bio(&self, id: i32, bio: Option<&str>) -> Result<User> {
        self.user_repo().update_bio(id, bio).await
    }

    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        self.follow_repo().follow(follower_id, followed_id).await
    }

    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        self.follow_repo().unfollow(follower_id, followed_id).await
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.follow_repo()
            .is_following(follower_id, followed_id)
            .await
    }

    pub async fn following(&self, user_id: i32) -> Result<Vec<User>> {
        self.follow_repo().following(user_id).await
    }

    pub async fn followers(&self, user_id: i32) -> Result<Vec<User>> {
        self.follow_repo().followers(user_id).await
    }

    pub async fn create_message(&self, user_id: i32, text: &str) -> Result<Message> {
        self.message_repo().create(user_id, text).await
    }

    pub async fn messages_for_user(&self, user_id: i32) -> Result<Vec<Message>> {
        self.message_repo().list_for_user(user_id).await
    }

    /// Reset to a known-empty state, child tables first. Used by tests
    /// between cases.
    pub async fn clear_all(&self) -> Result<()> {
        follows::Entity::delete_many().exec(&self.conn).await?;
        messages::Entity::delete_many().exec(&self.conn).await?;
        users::Entity::delete_many().exec(&self.conn).await?;
        Ok(())
    }
}
