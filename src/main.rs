//! Routine Advisor
//!
//! Serves a product catalog with category filtering and search, keeps the user's
//! product selection across restarts, and runs a selection-aware chat with a beauty
//! advisor behind a completion relay.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod catalog;
mod config;
mod conversation;
mod core;
mod providers;
mod render;
mod routes;
mod selection;

use crate::app::Storefront;
use crate::catalog::Catalog;
use crate::config::{Config, PromptTemplate};
use crate::core::{ChatSettings, Debouncer};
use crate::providers::{CompletionClient, RelayClient, RelayConfig};
use crate::selection::FileStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storefront: Arc<Mutex<Storefront>>,
    pub client: Arc<dyn CompletionClient>,
    pub search: Arc<Debouncer>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routine_advisor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // A catalog that cannot be loaded or parsed is fatal
    let catalog = Catalog::load(&config.catalog_source).await?;
    tracing::info!(
        "Loaded {} product(s) in {} categories from {}",
        catalog.len(),
        catalog.categories().len(),
        config.catalog_source
    );

    let persona = match &config.prompt_file {
        Some(path) => PromptTemplate::load_from_file(path).await?,
        None => PromptTemplate::builtin(),
    };
    tracing::info!("Advisor persona: {}", persona.persona.name);

    let storage = Arc::new(FileStorage::new(&config.data_dir));
    let storefront = Storefront::new(
        catalog,
        storage,
        ChatSettings::new(&config, &persona),
    )
    .await;

    let client = RelayClient::new(RelayConfig {
        url: config.relay_url.clone(),
        timeout_secs: config.relay_timeout_secs,
    })?;
    tracing::info!("Completion relay: {}", client.url());

    let state = AppState {
        storefront: Arc::new(Mutex::new(storefront)),
        client: Arc::new(client),
        search: Arc::new(Debouncer::new(config.search_debounce())),
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Routine Advisor running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
