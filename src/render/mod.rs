//! Page model
//!
//! The page is a pure projection of [`Storefront`]; it is rebuilt in full after
//! every event and serialized for the front end.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::app::Storefront;
use crate::catalog::filter::{no_results_message, results_info};
use crate::catalog::{search_placeholder, Product, View};
use crate::conversation::{EntryKind, TranscriptEntry};

pub const PLACEHOLDER_MESSAGE: &str = "Select a category or search all products to get started";
pub const NO_RESULTS_HINT: &str = "Try different keywords or check spelling";
pub const EMPTY_SELECTION_MESSAGE: &str =
    "No products selected yet. Click on product cards to add them!";
pub const TRUNCATION_NOTICE: &str =
    "Response may have been cut off. Try asking \"Can you continue?\" or be more specific.";

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub categories: Vec<String>,
    pub category: String,
    pub search_term: String,
    pub search_placeholder: String,
    pub products: ProductsPanel,
    pub selection: SelectionPanel,
    pub chat: ChatPanel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductsPanel {
    Placeholder {
        message: String,
    },
    NoResults {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
    Grid {
        #[serde(skip_serializing_if = "Option::is_none")]
        info: Option<String>,
        cards: Vec<ProductCard>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub image: String,
    pub selected: bool,
    pub action_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionPanel {
    pub count: usize,
    /// "N product(s) selected", absent when the selection is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    pub items: Vec<SelectedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedItem {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatPanel {
    pub session_id: Uuid,
    /// An exchange is in flight; input should be disabled
    pub loading: bool,
    pub entries: Vec<ChatEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub kind: EntryKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation_notice: Option<&'static str>,
    pub at: DateTime<Utc>,
}

pub fn page(state: &Storefront) -> PageView {
    PageView {
        categories: state.catalog().categories(),
        category: state.category().to_string(),
        search_term: state.search_term().to_string(),
        search_placeholder: search_placeholder(state.catalog(), state.category()),
        products: products_panel(state),
        selection: selection_panel(state),
        chat: chat_panel(state),
    }
}

fn products_panel(state: &Storefront) -> ProductsPanel {
    let category = state.category();
    let term = state.search_term();

    match state.view() {
        View::None => ProductsPanel::Placeholder {
            message: PLACEHOLDER_MESSAGE.to_string(),
        },
        View::Results(products) if products.is_empty() => ProductsPanel::NoResults {
            message: no_results_message(category, term),
            hint: (!term.is_empty()).then(|| NO_RESULTS_HINT.to_string()),
        },
        View::Results(products) => ProductsPanel::Grid {
            info: results_info(products.len(), category, term),
            cards: products
                .iter()
                .map(|p| product_card(p, state.selection().contains(p.id)))
                .collect(),
        },
    }
}

fn product_card(product: &Product, selected: bool) -> ProductCard {
    ProductCard {
        id: product.id,
        name: product.name.clone(),
        brand: product.brand.clone(),
        description: product.description.clone(),
        image: product.image.clone(),
        selected,
        action_label: if selected { "✓ Added" } else { "+ Add to Routine" },
    }
}

fn selection_panel(state: &Storefront) -> SelectionPanel {
    let selection = state.selection();
    let count = selection.len();

    if count == 0 {
        return SelectionPanel {
            count,
            heading: None,
            empty_message: Some(EMPTY_SELECTION_MESSAGE.to_string()),
            items: Vec::new(),
        };
    }

    SelectionPanel {
        count,
        heading: Some(format!(
            "{} product{} selected",
            count,
            if count == 1 { "" } else { "s" }
        )),
        empty_message: None,
        items: selection
            .products()
            .iter()
            .map(|p| SelectedItem {
                id: p.id,
                name: p.name.clone(),
                brand: p.brand.clone(),
                image: p.image.clone(),
            })
            .collect(),
    }
}

fn chat_panel(state: &Storefront) -> ChatPanel {
    ChatPanel {
        session_id: state.chat().id(),
        loading: state.chat().is_busy(),
        entries: state.chat().transcript().iter().map(chat_entry).collect(),
    }
}

fn chat_entry(entry: &TranscriptEntry) -> ChatEntry {
    ChatEntry {
        kind: entry.kind,
        text: entry.text.clone(),
        truncation_notice: entry.possibly_truncated.then_some(TRUNCATION_NOTICE),
        at: entry.at,
    }
}
