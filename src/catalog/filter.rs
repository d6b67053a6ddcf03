//! Category filter and free-text search over the catalog

use super::{Catalog, Product};

/// Result of applying the current category and search inputs
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Neither a category nor a search term is set
    None,
    /// Matching products in catalog order (possibly empty)
    Results(Vec<Product>),
}

impl View {
    pub fn products(&self) -> &[Product] {
        match self {
            View::None => &[],
            View::Results(products) => products,
        }
    }
}

/// Compute the filtered view.
///
/// The search term is trimmed and matched case-insensitively against name, brand,
/// description and category. When a category is also set the search is scoped to
/// it; with only a category set the match on `category` is exact.
pub fn compute_view(catalog: &Catalog, category: &str, search_term: &str) -> View {
    let term = search_term.trim();

    if term.is_empty() && category.is_empty() {
        return View::None;
    }

    let scoped = catalog
        .products()
        .iter()
        .filter(|p| category.is_empty() || p.category == category);

    if term.is_empty() {
        return View::Results(scoped.cloned().collect());
    }

    let needle = term.to_lowercase();
    View::Results(scoped.filter(|p| matches_term(p, &needle)).cloned().collect())
}

/// `needle` must already be lowercased
fn matches_term(product: &Product, needle: &str) -> bool {
    [
        &product.name,
        &product.brand,
        &product.description,
        &product.category,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Message shown when a view came back empty
pub fn no_results_message(category: &str, search_term: &str) -> String {
    let term = search_term.trim();
    match (term.is_empty(), category.is_empty()) {
        (false, false) => format!("No {} products found matching \"{}\"", category, term),
        (false, true) => format!("No products found matching \"{}\"", term),
        _ => format!("No products found in {}", category),
    }
}

/// Results line shown above a non-empty search result
pub fn results_info(count: usize, category: &str, search_term: &str) -> Option<String> {
    let term = search_term.trim();
    if term.is_empty() {
        return None;
    }
    let plural = if count == 1 { "" } else { "s" };
    let scope = if category.is_empty() {
        String::new()
    } else {
        format!(" in {}", category)
    };
    Some(format!(
        "Found {} product{}{} matching \"{}\"",
        count, plural, scope, term
    ))
}

pub fn search_placeholder(catalog: &Catalog, category: &str) -> String {
    if category.is_empty() {
        "Search all products by name or keyword...".to_string()
    } else {
        let count = catalog.in_category(category).count();
        format!(
            "Search {} {} products or all products...",
            count, category
        )
    }
}
