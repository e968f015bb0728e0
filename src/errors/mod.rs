pub mod types;
pub mod classification;

pub use types::AttestError;
pub use classification::ErrorCategory;
