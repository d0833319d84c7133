pub mod aggregate;
pub mod matrix;

// Re-export commonly used types
pub use aggregate::{
    aggregate, aggregate_with, similarity, AggregateObserver, LogObserver, MatchSummary,
    NoopObserver,
};
pub use matrix::{ComparisonMatrix, DistanceMatrix, MatchError};
