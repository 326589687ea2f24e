//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, correlation ID, panic catching)
//! - Own the worker registry and dispatcher shared by the handlers
//! - Unregister every worker when shutdown starts

use axum::{
    routing::{get, post},
    Router,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::{GatewayConfig, HealthCheckConfig};
use crate::dispatch::{Dispatcher, HttpWorkerClient, WorkerClient};
use crate::http::handlers;
use crate::http::request::{propagate_correlation_id_layer, set_correlation_id_layer};
use crate::http::response::panic_response;
use crate::load_balancer::WorkerRegistry;
use crate::resilience::RetryPolicy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<WorkerRegistry>,
    pub dispatcher: Dispatcher,
    pub health: HealthCheckConfig,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    registry: Arc<WorkerRegistry>,
}

impl GatewayServer {
    /// Create a new gateway server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let client = Arc::new(HttpWorkerClient::new(
            config.health_check.clone(),
            config.workers.clone(),
            config.dispatch.clone(),
        ));
        Self::with_client(config, client)
    }

    /// Create a server that reaches workers through `client`.
    pub fn with_client(config: GatewayConfig, client: Arc<dyn WorkerClient>) -> Self {
        let registry = Arc::new(WorkerRegistry::new(client));
        let dispatcher = Dispatcher::new(registry.clone(), RetryPolicy::from(&config.dispatch));

        let state = AppState {
            registry: registry.clone(),
            dispatcher,
            health: config.health_check.clone(),
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/register", post(handlers::register))
            .route("/unregister", post(handlers::unregister))
            .route("/health", get(handlers::health))
            .route("/workers", get(handlers::list_workers))
            .route("/balance", post(handlers::set_balance))
            .route("/balance/{user_id}", get(handlers::get_balance))
            .route("/check/{payer_id}", post(handlers::create_check))
            .route("/check/{recipient_id}/cash/{check_id}", post(handlers::cash_check))
            .route("/hello", get(handlers::hello))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_correlation_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_correlation_id_layer())
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
    }

    /// Registry shared with the handlers.
    pub fn registry(&self) -> Arc<WorkerRegistry> {
        self.registry.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until `shutdown` fires.
    ///
    /// Workers are unregistered as soon as the signal arrives, while in-flight
    /// requests drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, stopping HTTP server");
                let _ = stop_tx.send(());
            })
            .into_future();

        let registry = self.registry.clone();
        let cleanup = async move {
            // Sender dropped without a signal: the server stopped on its own.
            if stop_rx.await.is_err() {
                return;
            }
            let removed = registry.unregister_all().await;
            tracing::info!(removed, "All workers have been unregistered");
        };

        let (served, ()) = tokio::join!(serve, cleanup);
        served
    }
}
