pub mod follows;
pub mod messages;
pub mod users;
