//! Product catalog index
//!
//! Bidirectional mapping between external product identifiers, dense integer
//! indices, and display names. Everything downstream of the catalog works on
//! indices only.

use std::collections::HashMap;

use crate::domain::product::{Product, ProductId, ProductIndex};
use crate::errors::DomainError;

#[derive(Clone, Debug, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
    by_id: HashMap<ProductId, ProductIndex>,
    by_name: HashMap<String, ProductIndex>,
}

impl ProductCatalog {
    /// Build a catalog from products in any order.
    ///
    /// Indices must cover `[0, N)` exactly once, and both identifiers and
    /// display names must be unique.
    pub fn new(mut products: Vec<Product>) -> Result<Self, DomainError> {
        products.sort_by_key(|product| product.index);

        let mut by_id = HashMap::with_capacity(products.len());
        let mut by_name = HashMap::with_capacity(products.len());

        for (position, product) in products.iter().enumerate() {
            if product.index != position {
                return Err(DomainError::InvariantViolation(format!(
                    "catalog indices must be dense: expected index {position}, found {}",
                    product.index
                )));
            }
            if by_id.insert(product.id.clone(), product.index).is_some() {
                return Err(DomainError::InvariantViolation(format!(
                    "duplicate product identifier `{}`",
                    product.id
                )));
            }
            if by_name.insert(product.name.clone(), product.index).is_some() {
                return Err(DomainError::InvariantViolation(format!(
                    "duplicate product name `{}`",
                    product.name
                )));
            }
        }

        Ok(Self { products, by_id, by_name })
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn contains(&self, index: ProductIndex) -> bool {
        index < self.products.len()
    }

    pub fn index_of(&self, identifier: &str) -> Option<ProductIndex> {
        self.by_id.get(identifier).copied()
    }

    pub fn index_of_name(&self, name: &str) -> Option<ProductIndex> {
        self.by_name.get(name).copied()
    }

    /// Resolve a cart reference: exact identifier first, then display name.
    pub fn resolve(&self, reference: &str) -> Option<ProductIndex> {
        self.index_of(reference).or_else(|| self.index_of_name(reference))
    }

    pub fn name_of(&self, index: ProductIndex) -> Result<&str, DomainError> {
        self.product(index).map(|product| product.name.as_str())
    }

    pub fn identifier_of(&self, index: ProductIndex) -> Result<&ProductId, DomainError> {
        self.product(index).map(|product| &product.id)
    }

    pub fn product(&self, index: ProductIndex) -> Result<&Product, DomainError> {
        self.products
            .get(index)
            .ok_or(DomainError::InvalidIndex { index, len: self.products.len() })
    }

    /// Products in index order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(index: usize, id: &str, name: &str) -> Product {
        Product { index, id: ProductId::from(id), name: name.to_owned() }
    }

    fn grocery() -> ProductCatalog {
        ProductCatalog::new(vec![
            product(2, "SKU-BUTTER", "butter"),
            product(0, "SKU-BREAD", "bread"),
            product(3, "SKU-JAM", "jam"),
            product(1, "SKU-MILK", "milk"),
        ])
        .unwrap()
    }

    #[test]
    fn lookups_are_bidirectional() {
        let catalog = grocery();

        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.index_of("SKU-MILK"), Some(1));
        assert_eq!(catalog.index_of_name("jam"), Some(3));
        assert_eq!(catalog.name_of(2).unwrap(), "butter");
        assert_eq!(catalog.identifier_of(0).unwrap().as_str(), "SKU-BREAD");
        assert_eq!(catalog.index_of("bread"), None);
    }

    #[test]
    fn resolve_prefers_identifier_then_name() {
        let catalog = grocery();

        assert_eq!(catalog.resolve("SKU-JAM"), Some(3));
        assert_eq!(catalog.resolve("jam"), Some(3));
        assert_eq!(catalog.resolve("caviar"), None);
    }

    #[test]
    fn name_of_out_of_range_is_invalid_index() {
        let catalog = grocery();

        assert_eq!(catalog.name_of(4), Err(DomainError::InvalidIndex { index: 4, len: 4 }));
    }

    #[test]
    fn products_iterate_in_index_order() {
        let names: Vec<_> = grocery().products().map(|product| product.name.clone()).collect();
        assert_eq!(names, ["bread", "milk", "butter", "jam"]);
    }

    #[test]
    fn sparse_indices_are_rejected() {
        let error = ProductCatalog::new(vec![product(0, "a", "A"), product(2, "b", "B")])
            .unwrap_err();
        assert!(matches!(error, DomainError::InvariantViolation(ref message) if message.contains("dense")));
    }

    #[test]
    fn duplicate_identifiers_and_names_are_rejected() {
        let duplicate_id =
            ProductCatalog::new(vec![product(0, "a", "A"), product(1, "a", "B")]).unwrap_err();
        assert!(matches!(duplicate_id, DomainError::InvariantViolation(ref m) if m.contains("identifier")));

        let duplicate_name =
            ProductCatalog::new(vec![product(0, "a", "A"), product(1, "b", "A")]).unwrap_err();
        assert!(matches!(duplicate_name, DomainError::InvariantViolation(ref m) if m.contains("name")));
    }
}
