//! Candidate accumulation and ranking

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::product::ProductIndex;

use super::types::SignalType;
use super::RecommendResult;

/// A candidate with its accumulated score and first recorded explanation
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub index: ProductIndex,
    pub score: f64,
    pub reason: String,
    pub signal: SignalType,
}

/// Per-call score accumulator.
///
/// Candidates are kept in first-insertion order, which is the tie-break
/// order used by [`CandidatePool::into_ranked`]. The explanation of a
/// candidate is written once, by its first contribution.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    slots: HashMap<ProductIndex, usize>,
    candidates: Vec<ScoredCandidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to a candidate's score. `explain` runs only when the
    /// candidate has no explanation yet.
    pub fn contribute<F>(
        &mut self,
        index: ProductIndex,
        amount: f64,
        signal: SignalType,
        explain: F,
    ) -> RecommendResult<()>
    where
        F: FnOnce() -> RecommendResult<String>,
    {
        if let Some(&slot) = self.slots.get(&index) {
            self.candidates[slot].score += amount;
            return Ok(());
        }

        let reason = explain()?;
        self.slots.insert(index, self.candidates.len());
        self.candidates.push(ScoredCandidate { index, score: amount, reason, signal });
        Ok(())
    }

    pub fn get(&self, index: ProductIndex) -> Option<&ScoredCandidate> {
        self.slots.get(&index).map(|&slot| &self.candidates[slot])
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Sort by score descending and keep the first `top_n`.
    ///
    /// The sort is stable, so exactly equal scores keep insertion order.
    pub fn into_ranked(self, top_n: usize) -> Vec<ScoredCandidate> {
        let mut ranked = self.candidates;
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(top_n);
        ranked
    }
}

/// Round a score to 4 decimal places for output.
///
/// Rounds the exact binary value; scaling by 10^4 first can land on a false
/// half-way point and round the wrong way.
pub fn round_score(score: f64) -> f64 {
    format!("{score:.4}").parse().unwrap_or(score)
}
