pub mod formatting;
pub mod truncation;

pub use truncation::truncate_excerpt;
