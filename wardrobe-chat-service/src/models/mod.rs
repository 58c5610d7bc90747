pub mod chat;
pub mod wardrobe;

pub use chat::{ChatMessage, ChatRequest, ChatResponse};
pub use wardrobe::{UserProfile, WardrobeItem};
