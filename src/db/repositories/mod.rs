pub mod follow;
pub mod message;
pub mod user;
