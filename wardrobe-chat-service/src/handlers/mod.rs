pub mod chat;
pub mod health;

pub use chat::chat_reply;
pub use health::health_check;
