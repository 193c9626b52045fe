pub mod message_service;
pub mod message_service_impl;
pub mod user_service;
pub mod user_service_impl;

pub use message_service::{MessageError, MessageService};
pub use message_service_impl::SeaOrmMessageService;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
