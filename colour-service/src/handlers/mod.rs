pub mod analyze;
pub mod health;

pub use analyze::analyze_photo;
pub use health::health_check;
