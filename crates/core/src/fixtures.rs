//! Deterministic demo dataset
//!
//! A small grocery catalog with mined rules and neighbor lists, used by the
//! `seed` command and by tests that need realistic artifacts on disk.

use crate::artifacts::{CatalogFile, NeighborRecord, NeighborsFile, RulesFile};
use crate::domain::product::{Product, ProductId};
use crate::rules::RawRule;

struct ProductSeed {
    id: &'static str,
    name: &'static str,
}

const PRODUCT_SEEDS: &[ProductSeed] = &[
    ProductSeed { id: "GRC-0001", name: "bread" },
    ProductSeed { id: "GRC-0002", name: "milk" },
    ProductSeed { id: "GRC-0003", name: "butter" },
    ProductSeed { id: "GRC-0004", name: "jam" },
    ProductSeed { id: "GRC-0005", name: "eggs" },
    ProductSeed { id: "GRC-0006", name: "cheese" },
    ProductSeed { id: "GRC-0007", name: "coffee" },
    ProductSeed { id: "GRC-0008", name: "sugar" },
];

struct RuleSeed {
    antecedent: &'static [usize],
    consequent: &'static [usize],
    support: f64,
    confidence: f64,
    lift: f64,
}

const RULE_SEEDS: &[RuleSeed] = &[
    RuleSeed { antecedent: &[0], consequent: &[2], support: 0.12, confidence: 0.5, lift: 2.0 },
    RuleSeed { antecedent: &[0], consequent: &[3], support: 0.07, confidence: 0.3, lift: 1.4 },
    RuleSeed { antecedent: &[0, 1], consequent: &[4], support: 0.05, confidence: 0.4, lift: 1.8 },
    RuleSeed { antecedent: &[6], consequent: &[7], support: 0.09, confidence: 0.6, lift: 2.5 },
    RuleSeed { antecedent: &[1, 6], consequent: &[7], support: 0.04, confidence: 0.7, lift: 2.9 },
    RuleSeed { antecedent: &[2, 0], consequent: &[3, 5], support: 0.03, confidence: 0.35, lift: 1.6 },
];

const NEIGHBOR_SEEDS: &[(usize, &[(usize, f64)])] = &[
    (0, &[(2, 0.62), (3, 0.41), (5, 0.22)]),
    (1, &[(3, 0.8), (6, 0.44), (4, 0.31)]),
    (2, &[(0, 0.62), (5, 0.38)]),
    (4, &[(5, 0.52), (1, 0.31)]),
    (6, &[(7, 0.71), (1, 0.44)]),
];

pub fn sample_catalog() -> CatalogFile {
    CatalogFile {
        products: PRODUCT_SEEDS
            .iter()
            .enumerate()
            .map(|(index, seed)| Product {
                index,
                id: ProductId::from(seed.id),
                name: seed.name.to_owned(),
            })
            .collect(),
    }
}

pub fn sample_rules() -> RulesFile {
    RulesFile {
        rules: RULE_SEEDS
            .iter()
            .map(|seed| RawRule {
                antecedent: seed.antecedent.to_vec(),
                consequent: seed.consequent.to_vec(),
                support: seed.support,
                confidence: seed.confidence,
                lift: seed.lift,
            })
            .collect(),
    }
}

pub fn sample_neighbors() -> NeighborsFile {
    NeighborsFile {
        neighbors: NEIGHBOR_SEEDS
            .iter()
            .map(|(source, edges)| NeighborRecord { source: *source, edges: edges.to_vec() })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactBundle;
    use crate::recommend::{Recommender, SignalType};

    fn sample_recommender() -> Recommender {
        ArtifactBundle::from_parts(
            sample_catalog().products,
            sample_rules().rules,
            sample_neighbors().neighbors,
        )
        .unwrap()
        .into()
    }

    #[test]
    fn sample_dataset_passes_artifact_validation() {
        let recommender = sample_recommender();
        assert_eq!(recommender.catalog().len(), PRODUCT_SEEDS.len());
        assert_eq!(recommender.rules().len(), RULE_SEEDS.len());
        assert_eq!(recommender.neighbors().len(), NEIGHBOR_SEEDS.len());
    }

    #[test]
    fn sample_breakfast_cart_prefers_rule_candidates() {
        let results = sample_recommender().recommend(&["bread", "milk"], 12, 0.7).unwrap();

        assert_eq!(results[0].product, "butter");
        assert_eq!(results[0].signal, SignalType::RuleBased);
        assert!(results.iter().all(|r| r.product != "bread" && r.product != "milk"));
        assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }
}
