//! The user's product selection
//!
//! An ordered set of products, unique by id. Mutations go through
//! [`SelectionStore`](store::SelectionStore), which persists after every change.

pub mod store;

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

pub use store::{FileStorage, KeyValueStorage, SelectionStore};

/// Whether a toggle added or removed the product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    products: Vec<Product>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted list, dropping any repeated ids
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut selection = Self::new();
        for product in products {
            if !selection.contains(product.id) {
                selection.products.push(product);
            }
        }
        selection
    }

    /// Remove the product if present, append it otherwise
    pub fn toggle(&mut self, product: &Product) -> Toggled {
        match self.products.iter().position(|p| p.id == product.id) {
            Some(index) => {
                self.products.remove(index);
                Toggled::Removed
            }
            None => {
                self.products.push(product.clone());
                Toggled::Added
            }
        }
    }

    pub fn clear(&mut self) {
        self.products.clear();
    }

    pub fn contains(&self, id: i64) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.products.iter().map(|p| p.id).collect()
    }

    /// Human-readable listing for the advisor prompt, `None` when empty
    pub fn describe(&self) -> Option<String> {
        if self.products.is_empty() {
            return None;
        }
        Some(
            self.products
                .iter()
                .map(Product::summary)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{product, sample_catalog};

    #[test]
    fn test_toggle_removes_existing() {
        let catalog = sample_catalog();
        let mut selection = Selection::new();
        selection.toggle(catalog.get(1).unwrap());
        selection.toggle(catalog.get(2).unwrap());

        assert_eq!(selection.toggle(catalog.get(1).unwrap()), Toggled::Removed);
        assert_eq!(selection.ids(), vec![2]);
    }

    #[test]
    fn test_double_toggle_restores_prior_state() {
        let catalog = sample_catalog();
        let mut selection = Selection::new();
        selection.toggle(catalog.get(3).unwrap());
        selection.toggle(catalog.get(5).unwrap());

        for product in catalog.products() {
            let before = selection.clone();
            selection.toggle(product);
            selection.toggle(product);
            assert_eq!(selection.ids().len(), before.ids().len());
            let mut after_ids = selection.ids();
            let mut before_ids = before.ids();
            after_ids.sort();
            before_ids.sort();
            assert_eq!(after_ids, before_ids);
        }
    }

    #[test]
    fn test_no_duplicates_after_any_sequence() {
        let catalog = sample_catalog();
        let mut selection = Selection::new();
        let sequence = [1, 2, 1, 3, 3, 3, 4, 1, 2, 6, 5, 5, 1];
        for id in sequence {
            selection.toggle(catalog.get(id).unwrap());
            let mut ids = selection.ids();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), selection.len());
        }
    }

    #[test]
    fn test_from_products_drops_repeats() {
        let a = product(1, "A", "B", "c", "d");
        let selection = Selection::from_products(vec![a.clone(), a.clone(), product(2, "E", "F", "c", "d")]);
        assert_eq!(selection.ids(), vec![1, 2]);
    }

    #[test]
    fn test_describe() {
        let catalog = sample_catalog();
        let mut selection = Selection::new();
        assert_eq!(selection.describe(), None);

        selection.toggle(catalog.get(1).unwrap());
        selection.toggle(catalog.get(5).unwrap());
        assert_eq!(
            selection.describe().unwrap(),
            "Hydrating Facial Cleanser by CeraVe (cleanser), Lash Sensational Mascara by Maybelline (makeup)"
        );
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut selection = Selection::new();
        selection.toggle(&product(7, "A", "B", "c", "d"));
        let json = serde_json::to_value(&selection).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], 7);
    }
}
