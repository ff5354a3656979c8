//! # tradelens: AI-assisted trade extraction service
//!
//! `tradelens` is the extraction backend of a trading-journal product. Given a
//! screenshot of a broker's trade history (plus OCR text produced client-side),
//! it extracts the individual trades using a tiered AI pipeline:
//!
//! - A cheap **lite** tier runs a text-only model over the OCR output.
//! - An expensive **deep** tier runs a vision model over the raw image, used
//!   when OCR quality is poor, on user-initiated retries, or as a single
//!   bounded escalation when the lite tier under-delivers.
//!
//! Every request passes three gates before any paid call: a sliding-window
//! rate limiter, a monthly per-user budget, and a fingerprint-keyed result
//! cache. All spend is priced in integer cents and recorded in an append-only
//! cost log.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); persistence is
//! PostgreSQL behind the [`db::ExtractionStore`] trait, with an in-memory
//! implementation for tests and URL-less development runs. The pipeline
//! itself lives in [`extraction`], with [`extraction::ExtractionRouter`] as
//! the state machine sequencing gates, tier selection, response repair and
//! side effects.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use tradelens::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = tradelens::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     tradelens::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
mod openapi;
pub mod telemetry;
pub mod types;

use crate::db::{ExtractionStore, MemoryStore, PgStore};
use crate::extraction::{CostLedger, ExtractionRouter, HttpInferenceClient, InferenceClient};
use crate::openapi::ApiDoc;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;

pub use config::Config;
pub use types::UserId;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ExtractionStore>,
    pub ledger: Arc<CostLedger>,
    pub router: Arc<ExtractionRouter>,
}

impl AppState {
    /// Wire the pipeline onto the given store and inference client.
    pub fn new(
        config: Config,
        store: Arc<dyn ExtractionStore>,
        client: Arc<dyn InferenceClient>,
    ) -> Self {
        let ledger = Arc::new(CostLedger::new(store.clone(), config.budget.clone()));
        let router = Arc::new(ExtractionRouter::new(
            store.clone(),
            client,
            ledger.clone(),
            &config,
        ));
        Self {
            config: Arc::new(config),
            store,
            ledger,
            router,
        }
    }
}

/// Get the tradelens database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/extractions", post(api::handlers::extraction::extract_trades))
        .route("/usage/budget", get(api::handlers::usage::get_budget))
        .route("/usage/history", get(api::handlers::usage::list_history))
        .route(
            "/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(api::handlers::health::health))
        .nest("/api/v1", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct owning all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects storage (running migrations on
///    Postgres) and wires the pipeline.
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Arc<Config>,
}

impl Application {
    /// Create a new application instance with all resources initialized.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

        let store: Arc<dyn ExtractionStore> = match &config.database.url {
            Some(url) => {
                info!("Connecting to Postgres");
                let store = PgStore::connect(url, config.database.max_connections).await?;
                Arc::new(store)
            }
            None => {
                info!("No database URL configured; using in-memory store (state is not persisted)");
                Arc::new(MemoryStore::new())
            }
        };

        let client = Arc::new(HttpInferenceClient::new(&config.inference)?);
        let state = AppState::new(config, store, client);
        let config = state.config.clone();
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Start serving the application until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("tradelens listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutdown complete");
        Ok(())
    }
}

/// Minimal state over the in-memory store, for extractor and handler tests.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let config = Config::default();
    let client = Arc::new(
        HttpInferenceClient::new(&config.inference).expect("test inference client"),
    );
    AppState::new(config, Arc::new(MemoryStore::new()), client)
}
