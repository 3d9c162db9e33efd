//! HTTP server setup and middleware composition.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire the admission chain in its fixed order
//! - Attach per-route permission requirements
//! - Bind the server to a listener and serve with graceful shutdown
//! - Spawn the rate limiter's eviction sweep

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GateConfig;
use crate::directory::UserDirectory;
use crate::gate::{
    authenticate_middleware, rate_limit_middleware, require_permission_middleware,
    RateLimiter, RequiredPermission,
};
use crate::http::handlers;

/// HTTP server wrapping the resource routes in the admission chain.
pub struct GateServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<RateLimiter>,
}

impl GateServer {
    /// Create a new server from validated configuration and a user
    /// directory.
    pub fn new(config: GateConfig, directory: Arc<dyn UserDirectory>) -> Self {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let router = Self::build_router(&config, limiter.clone(), directory);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the router with the admission chain.
    ///
    /// The `ServiceBuilder` stack reads outermost first, so a request
    /// passes request-id → trace → timeout → rate limit → authenticate,
    /// then any per-route permission gate, then the handler. The order is
    /// decided here, once, and nowhere else.
    fn build_router(config: &GateConfig, limiter: Arc<RateLimiter>, directory: Arc<dyn UserDirectory>) -> Router {
        let read_routes = Router::new()
            .route("/v1/movies", get(handlers::list_movies))
            .route_layer(middleware::from_fn_with_state(
                RequiredPermission::new(directory.clone(), "movies:read"),
                require_permission_middleware,
            ));

        let write_routes = Router::new()
            .route("/v1/movies", post(handlers::create_movie))
            .route_layer(middleware::from_fn_with_state(
                RequiredPermission::new(directory.clone(), "movies:write"),
                require_permission_middleware,
            ));

        Router::new()
            .route("/v1/healthcheck", get(handlers::healthcheck))
            .merge(read_routes)
            .merge(write_routes)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
                    .layer(middleware::from_fn_with_state(directory, authenticate_middleware)),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admission gate listening");

        // The sweep keeps the limiter registry bounded under client churn.
        if self.config.rate_limit.enabled {
            let sweep_shutdown = shutdown.resubscribe();
            tokio::spawn(self.limiter.clone().run_eviction(sweep_shutdown));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}
