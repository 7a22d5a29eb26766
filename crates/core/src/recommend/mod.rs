//! Hybrid cart recommendations
//!
//! Blends association-rule matches against the cart with item-item
//! similarity neighbors, then ranks and explains the resulting candidates.

mod engine;
mod scoring;
mod types;

pub use engine::{HybridScorer, Recommender};
pub use scoring::{round_score, CandidatePool, ScoredCandidate};
pub use types::*;

use crate::errors::DomainError;

/// Result type for recommendation operations
pub type RecommendResult<T> = Result<T, DomainError>;

/// Number of recommendations returned when the caller does not ask otherwise
pub const DEFAULT_TOP_N: usize = 12;

/// Weight applied to similarity contributions relative to rule contributions
pub const DEFAULT_ALPHA: f64 = 0.7;

/// Largest cart subset explored for partial rule matches
pub const MAX_SUBSET_SIZE: usize = 2;
