pub mod analysis;
pub mod image;

pub use analysis::{AnalysisError, ColourAnalyzer};
pub use image::{normalize_photo, EncodedPhoto};
