pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;

use axum::{middleware, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{require_bearer, TokenValidator};
use crate::config::{Config, StorageBackend};
use crate::db::{MemoryStore, PgStore, Store};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenValidator>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt_secret: &str) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenValidator::new(jwt_secret)),
        }
    }
}

/// Build the full router; everything except `/api/ping` needs a bearer token
pub fn build_router(state: AppState) -> Router {
    let protected = api::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_bearer,
    ));

    Router::new()
        .merge(api::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.storage {
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database_url, config.max_connections).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            let store = match &config.memory_seed {
                Some(path) => MemoryStore::from_seed_file(path).await?,
                None => MemoryStore::new(),
            };
            tracing::warn!("using in-memory storage, data is lost on shutdown");
            Ok(Arc::new(store))
        }
    }
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let state = AppState::new(store, &config.jwt_secret);
    let app = build_router(state);

    let listener = TcpListener::bind(&config.server_address).await?;
    tracing::info!("Server listening on {}", config.server_address);

    axum::serve(listener, app).await?;

    Ok(())
}
