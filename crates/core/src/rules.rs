//! Association rule table
//!
//! Mined rules grouped by their exact antecedent set. The antecedent is
//! normalized to an ascending, duplicate-free tuple so that lookup is
//! independent of the order items were listed in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductIndex;

/// Order-independent key for an antecedent item set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AntecedentKey(Vec<ProductIndex>);

impl AntecedentKey {
    pub fn canonical(items: impl IntoIterator<Item = ProductIndex>) -> Self {
        Self(canonical_items(items))
    }

    pub fn items(&self) -> &[ProductIndex] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A rule as produced by the offline miner, before grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRule {
    pub antecedent: Vec<ProductIndex>,
    pub consequent: Vec<ProductIndex>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

/// A loaded rule, stored under its antecedent key.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssociationRule {
    /// Consequent items, ascending
    pub consequents: Vec<ProductIndex>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl AssociationRule {
    /// Contribution of this rule to a candidate matched on the full antecedent.
    pub fn strength(&self) -> f64 {
        self.confidence * self.lift
    }
}

#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    groups: HashMap<AntecedentKey, Vec<AssociationRule>>,
    rule_count: usize,
}

impl RuleTable {
    /// Group raw rules by canonical antecedent, keeping input order inside
    /// each group.
    pub fn build(rules: impl IntoIterator<Item = RawRule>) -> Self {
        let mut groups: HashMap<AntecedentKey, Vec<AssociationRule>> = HashMap::new();
        let mut rule_count = 0;

        for rule in rules {
            let key = AntecedentKey::canonical(rule.antecedent);
            groups.entry(key).or_default().push(AssociationRule {
                consequents: canonical_items(rule.consequent),
                support: rule.support,
                confidence: rule.confidence,
                lift: rule.lift,
            });
            rule_count += 1;
        }

        Self { groups, rule_count }
    }

    pub fn lookup(&self, antecedent: &AntecedentKey) -> &[AssociationRule] {
        self.groups.get(antecedent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lookup for an item slice in any order.
    pub fn lookup_items(&self, items: &[ProductIndex]) -> &[AssociationRule] {
        self.lookup(&AntecedentKey::canonical(items.iter().copied()))
    }

    /// Total number of rules across all antecedents.
    pub fn len(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    pub fn antecedent_count(&self) -> usize {
        self.groups.len()
    }
}

fn canonical_items(items: impl IntoIterator<Item = ProductIndex>) -> Vec<ProductIndex> {
    let mut items: Vec<_> = items.into_iter().collect();
    items.sort_unstable();
    items.dedup();
    items
}
