pub mod backend;
pub mod context;
pub mod stylist;

pub use backend::{BackendClient, Lookup};
pub use context::build_wardrobe_context;
pub use stylist::{ChatError, StylistChat};
