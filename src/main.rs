//! Internship Tracker Backend
//!
//! Keeps the canonical list of internship applications for a guest owner, synced
//! with a SQLite or PostgREST row store, and serves it as a small JSON API.

mod api;
mod config;
mod errors;
mod identity;
mod models;
mod normalize;
mod repository;
mod stats;
mod store;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, StoreBackend};
use errors::StoreError;
use identity::FileIdentity;
use repository::ApplicationRepository;
use store::{PostgrestStore, RemoteStore, SqliteStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<ApplicationRepository>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Internship Tracker Backend");
    tracing::info!("Identity path: {:?}", config.identity_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    let store = open_store(&config.store).await?;
    let identity = Arc::new(FileIdentity::new(&config.identity_path));
    let repo = Arc::new(ApplicationRepository::new(store, identity));

    // Without an owner id nothing can be scoped, so this is fatal.
    repo.initialize().await?;

    let app = create_router(AppState { repo });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect to the configured store backend.
pub async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn RemoteStore>, StoreError> {
    match backend {
        StoreBackend::Sqlite { db_path } => {
            tracing::info!("Using SQLite store at {:?}", db_path);
            Ok(Arc::new(SqliteStore::open(db_path).await?))
        }
        StoreBackend::Postgrest {
            url,
            api_key,
            table,
            timeout,
        } => {
            let store = PostgrestStore::new(url, api_key.clone(), table, *timeout)?;
            tracing::info!("Using remote store at {}", store.table_url());
            if api_key.is_empty() {
                tracing::warn!("No store key configured (TRACKER_STORE_KEY). Requests will be anonymous!");
            }
            // Ownership is scoped by user_id filters only; the store must enforce
            // row-level security itself if owners need to be isolated.
            Ok(Arc::new(store))
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Applications
        .route("/applications", get(api::list_applications))
        .route("/applications", post(api::create_application))
        .route("/applications/{id}", get(api::get_application))
        .route("/applications/{id}", put(api::update_application))
        .route("/applications/{id}", delete(api::delete_application))
        // Derived views
        .route("/stats", get(api::get_stats))
        .route("/analytics", get(api::get_analytics))
        .route("/status", get(api::get_status))
        .route("/refresh", post(api::refresh));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
