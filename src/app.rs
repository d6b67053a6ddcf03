//! Application state and event dispatch
//!
//! [`Storefront`] owns every store. Each user action arrives as an [`AppEvent`] and
//! mutates exactly one of them; the page is then re-rendered from the whole state.

use serde::Deserialize;
use std::sync::Arc;

use crate::catalog::{compute_view, Catalog, View};
use crate::core::{ChatError, ChatSession, ChatSettings, Outcome, PendingExchange, Reply};
use crate::render::{self, PageView};
use crate::selection::{KeyValueStorage, Selection, SelectionStore};

pub const SELECTION_CLEARED_NOTICE: &str = "All selected products have been cleared.";

/// A user action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// Category dropdown changed; an empty string means all categories
    SelectCategory { category: String },
    /// Search term settled (debounced keystrokes land here)
    Search { term: String },
    /// Escape key or the clear icon
    ClearSearch,
    /// Product card clicked; the id is resolved against the full catalog
    ToggleProduct { id: i64 },
    /// Remove button in the selection panel
    RemoveSelected { id: i64 },
    /// "Clear All", after the user answered the confirmation prompt
    ClearSelection { confirmed: bool },
    ResetChat,
}

pub struct Storefront {
    catalog: Catalog,
    selection: SelectionStore,
    category: String,
    search_term: String,
    view: View,
    chat: ChatSession,
}

impl Storefront {
    /// Build the initial state, restoring any persisted selection
    pub async fn new(
        catalog: Catalog,
        storage: Arc<dyn KeyValueStorage>,
        chat_settings: ChatSettings,
    ) -> Self {
        let selection = SelectionStore::load(storage).await;
        Self {
            catalog,
            selection,
            category: String::new(),
            search_term: String::new(),
            view: View::None,
            chat: ChatSession::new(chat_settings),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        self.selection.selection()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn render(&self) -> PageView {
        render::page(self)
    }

    pub async fn apply(&mut self, event: AppEvent) {
        tracing::debug!("Applying {:?}", event);
        match event {
            AppEvent::SelectCategory { category } => {
                self.category = category;
                self.refresh_view();
            }
            AppEvent::Search { term } => {
                self.search_term = term.trim().to_string();
                self.refresh_view();
            }
            AppEvent::ClearSearch => {
                self.search_term.clear();
                self.refresh_view();
            }
            AppEvent::ToggleProduct { id } => match self.catalog.get(id).cloned() {
                Some(product) => {
                    self.selection.toggle(&product).await;
                }
                None => tracing::debug!("Ignoring toggle for unknown product {}", id),
            },
            AppEvent::RemoveSelected { id } => match self.selection().get(id).cloned() {
                Some(product) => {
                    self.selection.toggle(&product).await;
                }
                None => tracing::debug!("Ignoring removal of unselected product {}", id),
            },
            AppEvent::ClearSelection { confirmed } => {
                if !confirmed {
                    tracing::debug!("Clear selection not confirmed");
                    return;
                }
                self.selection.clear().await;
                self.chat.add_notice(SELECTION_CLEARED_NOTICE);
            }
            AppEvent::ResetChat => self.chat.reset(),
        }
    }

    fn refresh_view(&mut self) {
        self.view = compute_view(&self.catalog, &self.category, &self.search_term);
    }

    pub fn begin_chat(&mut self, text: &str) -> Result<PendingExchange, ChatError> {
        self.chat.begin_message(self.selection.selection(), text)
    }

    pub fn begin_routine(&mut self) -> Result<Option<PendingExchange>, ChatError> {
        self.chat.begin_routine(self.selection.selection())
    }

    pub fn finish_chat(&mut self, exchange: PendingExchange, reply: Reply) -> Outcome {
        self.chat.finish(exchange, reply)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::selection::store::MemoryStorage;

    pub(crate) async fn storefront() -> Storefront {
        Storefront::new(
            sample_catalog(),
            Arc::new(MemoryStorage::new()),
            ChatSettings::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_starts_with_no_view() {
        let state = storefront().await;
        assert_eq!(state.view(), &View::None);
        assert!(state.selection().is_empty());
    }

    #[tokio::test]
    async fn test_category_then_search_narrows_view() {
        let mut state = storefront().await;
        state
            .apply(AppEvent::SelectCategory {
                category: "cleanser".into(),
            })
            .await;
        assert_eq!(state.view().products().len(), 2);

        state
            .apply(AppEvent::Search {
                term: " foaming ".into(),
            })
            .await;
        assert_eq!(state.search_term(), "foaming");
        assert_eq!(state.view().products()[0].id, 2);

        state.apply(AppEvent::ClearSearch).await;
        assert_eq!(state.view().products().len(), 2);

        state
            .apply(AppEvent::SelectCategory {
                category: String::new(),
            })
            .await;
        assert_eq!(state.view(), &View::None);
    }

    #[tokio::test]
    async fn test_toggle_resolves_against_full_catalog() {
        let mut state = storefront().await;
        state
            .apply(AppEvent::SelectCategory {
                category: "makeup".into(),
            })
            .await;
        // product 4 is not in the current view
        state.apply(AppEvent::ToggleProduct { id: 4 }).await;
        state.apply(AppEvent::ToggleProduct { id: 404 }).await;
        assert_eq!(state.selection().ids(), vec![4]);

        state.apply(AppEvent::RemoveSelected { id: 4 }).await;
        state.apply(AppEvent::RemoveSelected { id: 1 }).await;
        assert!(state.selection().is_empty());
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let mut state = storefront().await;
        state.apply(AppEvent::ToggleProduct { id: 1 }).await;
        state.apply(AppEvent::ToggleProduct { id: 2 }).await;

        state
            .apply(AppEvent::ClearSelection { confirmed: false })
            .await;
        assert_eq!(state.selection().len(), 2);
        assert!(state.chat().transcript().is_empty());

        state.apply(AppEvent::ClearSelection { confirmed: true }).await;
        assert!(state.selection().is_empty());
        assert_eq!(
            state.chat().transcript().last().unwrap().text,
            SELECTION_CLEARED_NOTICE
        );
        assert!(state.chat().history().is_empty());
    }

    #[tokio::test]
    async fn test_selection_survives_restart() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let mut state =
            Storefront::new(sample_catalog(), storage.clone(), ChatSettings::default()).await;
        state.apply(AppEvent::ToggleProduct { id: 5 }).await;
        state.apply(AppEvent::ToggleProduct { id: 6 }).await;

        let restarted = Storefront::new(sample_catalog(), storage, ChatSettings::default()).await;
        assert_eq!(restarted.selection().ids(), vec![5, 6]);
    }

    #[test]
    fn test_event_wire_format() {
        let event: AppEvent =
            serde_json::from_str(r#"{"type": "toggle_product", "id": 3}"#).unwrap();
        assert_eq!(event, AppEvent::ToggleProduct { id: 3 });

        let event: AppEvent =
            serde_json::from_str(r#"{"type": "clear_selection", "confirmed": true}"#).unwrap();
        assert_eq!(event, AppEvent::ClearSelection { confirmed: true });

        let event: AppEvent = serde_json::from_str(r#"{"type": "reset_chat"}"#).unwrap();
        assert_eq!(event, AppEvent::ResetChat);
    }
}
