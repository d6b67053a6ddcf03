//! Product catalog
//!
//! The catalog is loaded once at startup from a static `{ "products": [...] }`
//! document, either a local file or an http(s) URL. It is never mutated afterwards.

pub mod filter;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub use filter::{compute_view, search_placeholder, View};

/// A product as published in the catalog document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: String,
}

impl Product {
    /// Short form used when describing a selection to the advisor
    pub fn summary(&self) -> String {
        format!("{} by {} ({})", self.name, self.brand, self.category)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    products: Vec<Product>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog source returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The full, immutable product list
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Load from a file path or an http(s) URL
    pub async fn load(source: &str) -> Result<Self, CatalogError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::fetch(source).await
        } else {
            Self::from_file(Path::new(source)).await
        }
    }

    pub async fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub async fn fetch(url: &str) -> Result<Self, CatalogError> {
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }
        let body = response.text().await?;
        Self::from_json(&body)
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(content)?;
        Ok(Self::new(document.products))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products in the given category, catalog order preserved
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| p.category == category)
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for product in &self.products {
            if !categories.iter().any(|c| c == &product.category) {
                categories.push(product.category.clone());
            }
        }
        categories
    }
}
