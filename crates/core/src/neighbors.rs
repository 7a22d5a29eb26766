//! Item-item similarity neighbors

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductIndex;

/// One precomputed similarity edge from a source product.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborEdge {
    pub neighbor: ProductIndex,
    pub similarity: f64,
}

impl From<(ProductIndex, f64)> for NeighborEdge {
    fn from((neighbor, similarity): (ProductIndex, f64)) -> Self {
        Self { neighbor, similarity }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NeighborTable {
    edges: HashMap<ProductIndex, Vec<NeighborEdge>>,
}

impl NeighborTable {
    /// Edge lists are kept in the order supplied by the offline process.
    pub fn new(edges: HashMap<ProductIndex, Vec<NeighborEdge>>) -> Self {
        Self { edges }
    }

    pub fn neighbors_of(&self, index: ProductIndex) -> &[NeighborEdge] {
        self.edges.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of products with at least one recorded edge list.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

impl FromIterator<(ProductIndex, Vec<NeighborEdge>)> for NeighborTable {
    fn from_iter<T: IntoIterator<Item = (ProductIndex, Vec<NeighborEdge>)>>(iter: T) -> Self {
        let mut edges: HashMap<ProductIndex, Vec<NeighborEdge>> = HashMap::new();
        for (source, list) in iter {
            edges.entry(source).or_default().extend(list);
        }
        Self { edges }
    }
}
