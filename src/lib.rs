pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod slots;

// Re-export match types for convenience
pub use facecmp_match::{ComparisonMatrix, DistanceMatrix, MatchError, MatchSummary};

pub use client::{ComparisonClient, ServiceResponse};
pub use error::CompareError;
pub use session::{Comparator, ComparisonOutcome, ComparisonSession};
pub use slots::ImageSlots;
