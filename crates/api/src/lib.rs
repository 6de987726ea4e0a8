//! HTTP API server for the course storefront checkout core.
//!
//! Exposes the purchase flow (start, confirm, status), lecture progress
//! for enrolled users, and the operational endpoints, with structured
//! logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use catalog::{InMemoryCatalog, InMemoryUserStore};
use checkout::CheckoutOrchestrator;
use gateway::GatewayConfig;
use ledger::EnrollmentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::checkout::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EnrollmentStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout/{course_id}", post(routes::checkout::start::<S>))
        .route("/checkout/confirm", post(routes::checkout::confirm::<S>))
        .route(
            "/checkout/status/{payment_intent_id}",
            get(routes::checkout::status::<S>),
        )
        .route("/progress/{course_id}", get(routes::progress::get::<S>))
        .route(
            "/progress/{course_id}/lectures/{lecture_id}",
            post(routes::progress::complete_lecture::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a ledger store, with in-memory
/// boundary collaborators and the gateway selected from configuration.
pub fn create_default_state<S: EnrollmentStore + Clone + 'static>(
    store: S,
    gateway_config: &GatewayConfig,
) -> Arc<AppState<S>> {
    let catalog = InMemoryCatalog::new();
    let users = InMemoryUserStore::new();
    let gateway = gateway_config.select();

    let orchestrator = CheckoutOrchestrator::new(gateway, catalog.clone(), users.clone(), store);

    Arc::new(AppState {
        orchestrator,
        catalog,
        users,
    })
}
