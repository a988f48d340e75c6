//! Routine Picker - cosmetics product picker with an AI routine advisor
//!
//! Browse the catalog by category, pick products, and ask the advisor for a
//! routine that uses them, with follow-up questions in the same chat.
//! The selection survives restarts; the chat does not.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod config;
mod conversation;
mod providers;
mod render;
mod routes;
mod state;

use catalog::CatalogSource;
use config::Config;
use providers::{CompletionClient, OpenAICompatProvider};
use render::Renderer;
use state::{PickerSession, SelectionStore, SharedSession};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub catalog: Arc<dyn CatalogSource>,
    pub completion: Arc<dyn CompletionClient>,
    pub renderer: Arc<Renderer>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routine_picker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    if config.api_key.is_none() {
        tracing::warn!(
            "No API key in {}; completion requests will be sent unauthenticated",
            config.llm.api_key_env
        );
    }

    let store = Arc::new(SelectionStore::new(&config.database_path()).await?);
    let session = PickerSession::restore(store).await.into_shared();

    let catalog = catalog::from_location(&config.catalog_source);
    tracing::info!("📦 Catalog source: {}", catalog.location());

    let provider = OpenAICompatProvider::new(config.completion_config())?;
    tracing::info!("🤖 Advisor model: {}", provider.model());

    let state = AppState {
        session,
        catalog,
        completion: Arc::new(provider),
        renderer: Arc::new(Renderer::new()?),
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("💄 Routine Picker running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
