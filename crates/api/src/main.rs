//! API server entry point.

use api::config::Config;
use catalog::{Course, User};
use ledger::{EnrollmentStore, InMemoryEnrollmentStore, PostgresEnrollmentStore, Reconciler};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: EnrollmentStore + Clone + 'static>(
    store: S,
    config: Config,
    metrics_handle: PrometheusHandle,
) {
    let state = api::create_default_state(store.clone(), &config.gateway);

    // Simulated deployments get demo data so the flow is exercisable
    // out of the box.
    if !config.gateway.is_live() {
        let course_id = state.catalog.add_course(Course::new(
            "Intro to Rust",
            Decimal::new(4999, 2),
            "demo-instructor",
        ));
        let user_id = state.users.add_user(User::new("demo@example.com"));
        tracing::info!(%course_id, %user_id, "seeded demo catalog and user");
    }

    // Repair any partial enrollments left by a previous run before
    // taking traffic.
    let report = Reconciler::new(store, state.users.clone())
        .run()
        .await
        .expect("startup reconciliation failed");
    tracing::info!(?report, "startup reconciliation finished");

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the ledger backend and serve
    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");

            let store = PostgresEnrollmentStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");

            tracing::info!("using PostgreSQL enrollment store");
            serve(store, config, metrics_handle).await;
        }
        None => {
            tracing::info!("no DATABASE_URL configured, using in-memory enrollment store");
            serve(InMemoryEnrollmentStore::new(), config, metrics_handle).await;
        }
    }
}
