//! Application startup and lifecycle management.

use axum::{
    Json, extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{EscrowConfig, StorageConfig};
use crate::handlers::{AppState, api_router};
use crate::services::{
    BalanceService, EscrowService, LedgerStore, MemoryStore, OrderService, PayoutRules,
    PayoutService, PgStore, VendorLocks, VendorRepository, get_metrics, init_metrics,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": "escrow-service",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "escrow-service",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics endpoint for Prometheus scraping.
async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: EscrowConfig) -> Result<Self, AppError> {
        init_metrics();

        let (store, vendors): (Arc<dyn LedgerStore>, Arc<dyn VendorRepository>) =
            match &config.storage {
                StorageConfig::Postgres(db) => {
                    let pg = PgStore::new(&db.url, db.max_connections, db.min_connections)
                        .await
                        .map_err(|e| {
                            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                            AppError::DatabaseError(anyhow::anyhow!("{}", e))
                        })?;
                    pg.run_migrations().await.map_err(|e| {
                        tracing::error!(error = %e, "Failed to run migrations");
                        AppError::DatabaseError(anyhow::anyhow!("{}", e))
                    })?;
                    let pg = Arc::new(pg);
                    (pg.clone(), pg)
                }
                StorageConfig::Memory => {
                    tracing::warn!("Using in-memory storage; state will not survive restarts");
                    let mem = Arc::new(MemoryStore::new());
                    (mem.clone(), mem)
                }
            };

        let locks = VendorLocks::new();
        let rules = PayoutRules {
            currency: config.rules.currency.clone(),
            minimum_minor: config.rules.minimum_payout_minor,
            fee_rate: config.rules.payout_fee_rate,
        };

        let state = AppState {
            config: config.clone(),
            store: store.clone(),
            vendors: vendors.clone(),
            orders: OrderService::new(
                store.clone(),
                vendors.clone(),
                config.rules.default_platform_fee_rate,
            ),
            escrow: EscrowService::new(store.clone(), locks.clone()),
            payouts: PayoutService::new(store.clone(), vendors, locks, rules),
            balances: BalanceService::new(store, config.rules.currency.clone()),
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Escrow service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = api_router()
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(metrics_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        tracing::info!(
            service = "escrow-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await
    }
}
