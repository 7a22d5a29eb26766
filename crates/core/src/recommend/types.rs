//! Types for the hybrid recommender

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductIndex;

/// Request for cart recommendations
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    /// Product identifiers or display names currently in the cart
    pub cart_items: Vec<String>,
    /// Maximum number of recommendations to return
    pub top_n: usize,
    /// Weight applied to similarity contributions
    pub alpha: f64,
}

impl RecommendRequest {
    /// Create a request with default `top_n` and `alpha`
    pub fn new<I, S>(cart_items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cart_items: cart_items.into_iter().map(Into::into).collect(),
            top_n: super::DEFAULT_TOP_N,
            alpha: super::DEFAULT_ALPHA,
        }
    }

    /// Set the number of recommendations
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Set the similarity weight
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Which signal first surfaced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// Matched an association rule (exact cart or cart subset)
    RuleBased,
    /// Neighbor of a cart item by item-item similarity
    SimilarityBased,
}

impl SignalType {
    /// Get human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            SignalType::RuleBased => "Rule-based",
            SignalType::SimilarityBased => "Similarity-based",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A ranked, explained recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Display name of the recommended product
    pub product: String,
    /// Accumulated score, rounded to 4 decimal places
    pub score: f64,
    /// Explanation recorded by the first contributing signal
    pub reason: String,
    /// Signal that produced the explanation
    #[serde(rename = "type")]
    pub signal: SignalType,
}

/// Cart after catalog resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCart {
    items: Vec<ProductIndex>,
    dropped: Vec<String>,
}

impl ResolvedCart {
    pub(crate) fn new(mut items: Vec<ProductIndex>, dropped: Vec<String>) -> Self {
        items.sort_unstable();
        items.dedup();
        Self { items, dropped }
    }

    /// Distinct cart indices, ascending
    pub fn items(&self) -> &[ProductIndex] {
        &self.items
    }

    /// Cart references that matched nothing in the catalog
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub fn contains(&self, index: ProductIndex) -> bool {
        self.items.binary_search(&index).is_ok()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
