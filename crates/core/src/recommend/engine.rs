//! Hybrid scorer and the shared recommender service

use std::sync::Arc;

use crate::artifacts::ArtifactBundle;
use crate::catalog::ProductCatalog;
use crate::domain::product::ProductIndex;
use crate::errors::DomainError;
use crate::neighbors::NeighborTable;
use crate::rules::{AntecedentKey, RuleTable};

use super::scoring::{round_score, CandidatePool, ScoredCandidate};
use super::types::*;
use super::{RecommendResult, MAX_SUBSET_SIZE};

/// Scores a cart against borrowed, read-only tables.
#[derive(Debug, Clone, Copy)]
pub struct HybridScorer<'a> {
    catalog: &'a ProductCatalog,
    rules: &'a RuleTable,
    neighbors: &'a NeighborTable,
}

impl<'a> HybridScorer<'a> {
    pub fn new(
        catalog: &'a ProductCatalog,
        rules: &'a RuleTable,
        neighbors: &'a NeighborTable,
    ) -> Self {
        Self { catalog, rules, neighbors }
    }

    /// Map cart references to catalog indices, dropping unknown ones.
    pub fn resolve_cart<S: AsRef<str>>(&self, cart_items: &[S]) -> ResolvedCart {
        let mut items = Vec::with_capacity(cart_items.len());
        let mut dropped = Vec::new();

        for item in cart_items {
            let reference = item.as_ref();
            match self.catalog.resolve(reference) {
                Some(index) => items.push(index),
                None => dropped.push(reference.to_owned()),
            }
        }

        ResolvedCart::new(items, dropped)
    }

    /// Run the three signal passes in order: exact rules, subset rules,
    /// similarity. Explanations are first-writer-wins across passes.
    pub fn score(&self, cart: &ResolvedCart, alpha: f64) -> RecommendResult<CandidatePool> {
        let mut pool = CandidatePool::new();

        if cart.is_empty() {
            return Ok(pool);
        }

        let exact = AntecedentKey::canonical(cart.items().iter().copied());
        self.apply_rules(&mut pool, cart, &exact, 1.0)?;

        for subset in cart_subsets(cart.items()) {
            let damping = 1.0 / subset.len() as f64;
            self.apply_rules(&mut pool, cart, &subset, damping)?;
        }

        self.apply_similarity(&mut pool, cart, alpha)?;

        Ok(pool)
    }

    /// Full caller interface over borrowed tables.
    pub fn recommend<S: AsRef<str>>(
        &self,
        cart_items: &[S],
        top_n: usize,
        alpha: f64,
    ) -> RecommendResult<Vec<Recommendation>> {
        self.recommend_with_cart(cart_items, top_n, alpha)
            .map(|(_, recommendations)| recommendations)
    }

    /// Like [`HybridScorer::recommend`], also returning the resolved cart.
    pub fn recommend_with_cart<S: AsRef<str>>(
        &self,
        cart_items: &[S],
        top_n: usize,
        alpha: f64,
    ) -> RecommendResult<(ResolvedCart, Vec<Recommendation>)> {
        validate_arguments(top_n, alpha)?;

        let cart = self.resolve_cart(cart_items);
        let pool = self.score(&cart, alpha)?;
        let candidate_count = pool.len();
        let recommendations = pool
            .into_ranked(top_n)
            .into_iter()
            .map(|candidate| self.to_recommendation(candidate))
            .collect::<RecommendResult<Vec<_>>>()?;

        tracing::debug!(
            event_name = "recommend.scored",
            cart_items = cart_items.len(),
            resolved_items = cart.len(),
            dropped_items = cart.dropped().len(),
            candidates = candidate_count,
            returned = recommendations.len(),
            top_n,
            alpha,
            "cart scored"
        );

        Ok((cart, recommendations))
    }

    fn apply_rules(
        &self,
        pool: &mut CandidatePool,
        cart: &ResolvedCart,
        antecedent: &AntecedentKey,
        damping: f64,
    ) -> RecommendResult<()> {
        for rule in self.rules.lookup(antecedent) {
            let contribution = rule.strength() * damping;
            for &consequent in &rule.consequents {
                if cart.contains(consequent) {
                    continue;
                }
                pool.contribute(consequent, contribution, SignalType::RuleBased, || {
                    self.rule_reason(antecedent, consequent)
                })?;
            }
        }
        Ok(())
    }

    fn apply_similarity(
        &self,
        pool: &mut CandidatePool,
        cart: &ResolvedCart,
        alpha: f64,
    ) -> RecommendResult<()> {
        for &source in cart.items() {
            for edge in self.neighbors.neighbors_of(source) {
                if cart.contains(edge.neighbor) {
                    continue;
                }
                pool.contribute(
                    edge.neighbor,
                    alpha * edge.similarity,
                    SignalType::SimilarityBased,
                    || self.similarity_reason(source, edge.similarity),
                )?;
            }
        }
        Ok(())
    }

    fn rule_reason(
        &self,
        antecedent: &AntecedentKey,
        consequent: ProductIndex,
    ) -> RecommendResult<String> {
        let names = antecedent
            .items()
            .iter()
            .map(|&index| self.catalog.name_of(index))
            .collect::<RecommendResult<Vec<_>>>()?;
        Ok(format!("rule: {} → {}", names.join(", "), self.catalog.name_of(consequent)?))
    }

    fn similarity_reason(&self, source: ProductIndex, similarity: f64) -> RecommendResult<String> {
        Ok(format!("similarity to {} (sim={similarity:.3})", self.catalog.name_of(source)?))
    }

    fn to_recommendation(&self, candidate: ScoredCandidate) -> RecommendResult<Recommendation> {
        Ok(Recommendation {
            product: self.catalog.name_of(candidate.index)?.to_owned(),
            score: round_score(candidate.score),
            reason: candidate.reason,
            signal: candidate.signal,
        })
    }
}

/// Non-empty subsets of the sorted cart up to [`MAX_SUBSET_SIZE`] items:
/// all singletons, then all pairs, each in lexicographic order.
fn cart_subsets(items: &[ProductIndex]) -> Vec<AntecedentKey> {
    let max_size = MAX_SUBSET_SIZE.min(items.len());
    let mut subsets = Vec::new();

    if max_size >= 1 {
        subsets.extend(items.iter().map(|&item| AntecedentKey::canonical([item])));
    }
    if max_size >= 2 {
        for (position, &first) in items.iter().enumerate() {
            for &second in &items[position + 1..] {
                subsets.push(AntecedentKey::canonical([first, second]));
            }
        }
    }

    subsets
}

fn validate_arguments(top_n: usize, alpha: f64) -> RecommendResult<()> {
    if top_n == 0 {
        return Err(DomainError::InvalidArgument("top_n must be greater than zero".to_owned()));
    }
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(DomainError::InvalidArgument(format!(
            "alpha must be a finite, non-negative number (got {alpha})"
        )));
    }
    Ok(())
}

/// Process-wide recommender over tables loaded once at startup.
///
/// Clones share the same immutable tables, so the service can be handed to
/// any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct Recommender {
    artifacts: Arc<ArtifactBundle>,
}

impl Recommender {
    pub fn new(artifacts: Arc<ArtifactBundle>) -> Self {
        Self { artifacts }
    }

    /// Get recommendations for a cart
    pub fn recommend<S: AsRef<str>>(
        &self,
        cart_items: &[S],
        top_n: usize,
        alpha: f64,
    ) -> RecommendResult<Vec<Recommendation>> {
        self.scorer().recommend(cart_items, top_n, alpha)
    }

    /// Get recommendations for a prepared request
    pub fn recommend_request(
        &self,
        request: &RecommendRequest,
    ) -> RecommendResult<Vec<Recommendation>> {
        self.recommend(request.cart_items.as_slice(), request.top_n, request.alpha)
    }

    /// Get recommendations for a prepared request along with the resolved cart
    pub fn recommend_request_with_cart(
        &self,
        request: &RecommendRequest,
    ) -> RecommendResult<(ResolvedCart, Vec<Recommendation>)> {
        self.scorer().recommend_with_cart(
            request.cart_items.as_slice(),
            request.top_n,
            request.alpha,
        )
    }

    pub fn scorer(&self) -> HybridScorer<'_> {
        HybridScorer::new(&self.artifacts.catalog, &self.artifacts.rules, &self.artifacts.neighbors)
    }

    pub fn artifacts(&self) -> &ArtifactBundle {
        &self.artifacts
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.artifacts.catalog
    }

    pub fn rules(&self) -> &RuleTable {
        &self.artifacts.rules
    }

    pub fn neighbors(&self) -> &NeighborTable {
        &self.artifacts.neighbors
    }
}

impl From<ArtifactBundle> for Recommender {
    fn from(artifacts: ArtifactBundle) -> Self {
        Self::new(Arc::new(artifacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::NeighborRecord;
    use crate::domain::product::{Product, ProductId};
    use crate::rules::RawRule;

    fn product(index: usize, name: &str) -> Product {
        Product { index, id: ProductId(format!("SKU-{}", name.to_ascii_uppercase())), name: name.to_owned() }
    }

    fn rule(antecedent: &[usize], consequent: &[usize], confidence: f64, lift: f64) -> RawRule {
        RawRule {
            antecedent: antecedent.to_vec(),
            consequent: consequent.to_vec(),
            support: 0.05,
            confidence,
            lift,
        }
    }

    fn neighbors(source: usize, edges: &[(usize, f64)]) -> NeighborRecord {
        NeighborRecord { source, edges: edges.to_vec() }
    }

    fn recommender(rules: Vec<RawRule>, neighbor_records: Vec<NeighborRecord>) -> Recommender {
        let products = ["bread", "milk", "butter", "jam", "eggs", "cheese"]
            .iter()
            .enumerate()
            .map(|(index, name)| product(index, name))
            .collect();
        ArtifactBundle::from_parts(products, rules, neighbor_records).unwrap().into()
    }

    fn grocery() -> Recommender {
        recommender(vec![rule(&[0], &[2], 0.5, 2.0)], vec![neighbors(1, &[(3, 0.8)])])
    }

    #[test]
    fn worked_example_blends_rules_and_similarity() {
        let results = grocery().recommend(&["bread", "milk"], 5, 0.7).unwrap();

        assert_eq!(
            results,
            vec![
                Recommendation {
                    product: "butter".to_owned(),
                    score: 1.0,
                    reason: "rule: bread → butter".to_owned(),
                    signal: SignalType::RuleBased,
                },
                Recommendation {
                    product: "jam".to_owned(),
                    score: 0.56,
                    reason: "similarity to milk (sim=0.800)".to_owned(),
                    signal: SignalType::SimilarityBased,
                },
            ]
        );
    }

    #[test]
    fn zero_top_n_is_invalid_argument() {
        let error = grocery().recommend(&["bread"], 0, 0.7).unwrap_err();
        assert!(matches!(error, DomainError::InvalidArgument(ref message) if message.contains("top_n")));
    }

    #[test]
    fn negative_or_nan_alpha_is_invalid_argument() {
        let recommender = grocery();
        assert!(matches!(
            recommender.recommend(&["bread"], 5, -0.1),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(matches!(
            recommender.recommend(&["bread"], 5, f64::NAN),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn exact_match_scores_full_strength_and_explains_full_cart() {
        let recommender = recommender(
            vec![rule(&[1, 0], &[4], 0.5, 2.0), rule(&[0, 1, 3], &[5], 1.0, 1.0)],
            Vec::new(),
        );

        let results = recommender.recommend(&["bread", "milk", "jam"], 5, 0.7).unwrap();
        assert_eq!(results.len(), 2);
        // {bread, milk, jam} matches exactly; {bread, milk} only as a pair subset.
        assert_eq!(results[0].product, "cheese");
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[0].reason, "rule: bread, milk, jam → cheese");
        assert_eq!(results[1].product, "eggs");
        assert_eq!(results[1].score, 0.5);
        assert_eq!(results[1].reason, "rule: bread, milk → eggs");
    }

    #[test]
    fn exact_match_explanation_wins_over_subset_match() {
        let recommender = recommender(
            vec![rule(&[0], &[4], 0.2, 1.0), rule(&[0, 1, 3], &[4], 0.5, 2.0)],
            Vec::new(),
        );

        let results = recommender.recommend(&["bread", "milk", "jam"], 5, 0.7).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].product, "eggs");
        assert_eq!(results[0].signal, SignalType::RuleBased);
        assert_eq!(results[0].reason, "rule: bread, milk, jam → eggs");
        // 1.0 exact + 0.2 from the {bread} singleton
        assert_eq!(results[0].score, 1.2);
    }

    #[test]
    fn damped_pair_scores_round_on_the_exact_value() {
        let recommender = recommender(vec![rule(&[0, 1], &[4], 0.0007, 1.0)], Vec::new());

        let results = recommender.recommend(&["bread", "milk", "jam"], 5, 0.7).unwrap();
        assert_eq!(results[0].product, "eggs");
        assert_eq!(results[0].score, 0.0003);
    }

    #[test]
    fn recommend_with_cart_reports_resolution() {
        let (cart, results) = grocery()
            .scorer()
            .recommend_with_cart(&["milk", "caviar", "SKU-BREAD"], 5, 0.7)
            .unwrap();

        assert_eq!(cart.items(), &[0, 1]);
        assert_eq!(cart.dropped(), &["caviar".to_owned()]);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn two_item_cart_matches_exact_and_pair_subset() {
        let recommender = recommender(vec![rule(&[0, 1], &[4], 0.5, 2.0)], Vec::new());

        let results = recommender.recommend(&["milk", "bread"], 5, 0.7).unwrap();
        // 1.0 from the exact pass plus 1.0 / 2 from the pair subset.
        assert_eq!(results[0].score, 1.5);
        assert_eq!(results[0].reason, "rule: bread, milk → eggs");
    }

    #[test]
    fn subsets_larger_than_pairs_are_not_explored() {
        let recommender =
            recommender(vec![rule(&[0, 1, 2], &[4], 0.9, 3.0)], Vec::new());

        let results = recommender.recommend(&["bread", "milk", "butter", "jam"], 5, 0.7).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn cart_items_are_never_recommended() {
        let recommender = recommender(
            vec![rule(&[0], &[1, 2], 0.5, 2.0)],
            vec![neighbors(0, &[(1, 0.9), (3, 0.4)]), neighbors(1, &[(0, 0.9)])],
        );

        let results = recommender.recommend(&["bread", "milk"], 10, 0.7).unwrap();
        let products: Vec<_> = results.iter().map(|r| r.product.as_str()).collect();
        assert_eq!(products, vec!["butter", "jam"]);
    }

    #[test]
    fn rule_explanation_wins_over_similarity() {
        let recommender = recommender(
            vec![rule(&[0], &[3], 0.1, 1.0)],
            vec![neighbors(0, &[(3, 0.9)])],
        );

        let results = recommender.recommend(&["bread"], 5, 0.7).unwrap();
        assert_eq!(results[0].product, "jam");
        assert_eq!(results[0].signal, SignalType::RuleBased);
        assert_eq!(results[0].reason, "rule: bread → jam");
        // 0.1 exact + 0.1 singleton subset + 0.7 * 0.9 similarity
        assert_eq!(results[0].score, 0.83);
    }

    #[test]
    fn unknown_items_are_dropped_silently() {
        let recommender = grocery();

        let with_unknown = recommender.recommend(&["caviar", "bread", "milk", "SKU-NOPE"], 5, 0.7);
        let without = recommender.recommend(&["bread", "milk"], 5, 0.7);
        assert_eq!(with_unknown.unwrap(), without.unwrap());
    }

    #[test]
    fn identifiers_and_names_resolve_to_the_same_cart() {
        let recommender = grocery();
        let by_id = recommender.recommend(&["SKU-BREAD", "SKU-MILK"], 5, 0.7).unwrap();
        let by_name = recommender.recommend(&["bread", "milk", "milk"], 5, 0.7).unwrap();
        assert_eq!(by_id, by_name);
    }

    #[test]
    fn empty_or_unmatched_cart_returns_no_recommendations() {
        let recommender = grocery();

        assert!(recommender.recommend::<&str>(&[], 5, 0.7).unwrap().is_empty());
        assert!(recommender.recommend(&["caviar"], 5, 0.7).unwrap().is_empty());
        assert!(recommender.recommend(&["eggs"], 5, 0.7).unwrap().is_empty());
    }

    #[test]
    fn ties_keep_first_insertion_order() {
        let recommender = recommender(
            Vec::new(),
            vec![neighbors(0, &[(5, 0.5), (3, 0.5)]), neighbors(1, &[(2, 0.5)])],
        );

        let results = recommender.recommend(&["milk", "bread"], 5, 1.0).unwrap();
        let products: Vec<_> = results.iter().map(|r| r.product.as_str()).collect();
        assert_eq!(products, vec!["cheese", "jam", "butter"]);
    }

    #[test]
    fn output_is_truncated_and_non_increasing() {
        let recommender = recommender(
            vec![rule(&[0], &[2], 0.2, 1.0), rule(&[0], &[3], 0.9, 1.0)],
            vec![neighbors(0, &[(4, 0.6), (5, 0.1)])],
        );

        let all = recommender.recommend(&["bread"], 10, 0.7).unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|pair| pair[0].score >= pair[1].score));

        let top_two = recommender.recommend(&["bread"], 2, 0.7).unwrap();
        assert_eq!(top_two, all[..2].to_vec());
    }

    #[test]
    fn alpha_zero_keeps_similarity_candidates_at_zero_score() {
        let results = grocery().recommend(&["milk"], 5, 0.0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].product, "jam");
        assert_eq!(results[0].score, 0.0);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let recommender = recommender(
            vec![rule(&[0], &[2, 4], 0.5, 2.0), rule(&[1], &[4], 0.3, 1.2)],
            vec![neighbors(0, &[(3, 0.4), (5, 0.4)]), neighbors(1, &[(5, 0.2)])],
        );

        let first = serde_json::to_string(&recommender.recommend(&["bread", "milk"], 12, 0.7).unwrap())
            .unwrap();
        for _ in 0..10 {
            let again =
                serde_json::to_string(&recommender.recommend(&["milk", "bread"], 12, 0.7).unwrap())
                    .unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn request_form_uses_defaults() {
        let recommender = grocery();
        let request = RecommendRequest::new(["bread", "milk"]);
        assert_eq!(
            recommender.recommend_request(&request).unwrap(),
            recommender.recommend(&["bread", "milk"], 12, 0.7).unwrap()
        );
    }

    #[test]
    fn recommender_is_shareable_across_threads() {
        let recommender = grocery();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let recommender = recommender.clone();
                std::thread::spawn(move || recommender.recommend(&["bread", "milk"], 5, 0.7))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap().len(), 2);
        }
    }

    #[test]
    fn cart_subsets_are_singletons_then_pairs() {
        let subsets: Vec<Vec<usize>> =
            cart_subsets(&[1, 4, 6]).iter().map(|key| key.items().to_vec()).collect();
        assert_eq!(
            subsets,
            vec![vec![1], vec![4], vec![6], vec![1, 4], vec![1, 6], vec![4, 6]]
        );
        assert!(cart_subsets(&[]).is_empty());
    }
}
