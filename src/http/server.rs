//! HTTP server setup.
//!
//! # Responsibilities
//! - Assemble the application router, the cache middleware, the standard
//!   stack and the metrics endpoint according to [`ServiceConfig`]
//! - Register the HTTP metrics on the injected registry
//! - Serve connections with peer addresses attached, until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ServiceConfig;
use crate::http::middleware::disable_cache_on_get_requests;
use crate::http::stack::bind_standard_middleware;
use crate::lifecycle::shutdown::wait_for_shutdown;
use crate::observability::metrics::{render_metrics, HttpMetrics, MetricsError, MetricsRegistry};
use crate::routing::ServiceRouter;

/// HTTP server wrapping an application router in the standard stack.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Build the server.
    ///
    /// Fails when the HTTP metrics are already registered on `registry`.
    pub fn new(
        config: ServiceConfig,
        app: ServiceRouter,
        registry: Arc<MetricsRegistry>,
    ) -> Result<Self, MetricsError> {
        let (mut router, routes) = app.into_parts();

        let metrics_path = &config.observability.metrics_path;
        let mount_metrics = config.observability.metrics_enabled
            && !routes.patterns().any(|pattern| pattern == metrics_path.as_str());
        if config.observability.metrics_enabled && !mount_metrics {
            tracing::warn!(path = %metrics_path, "metrics path is taken by an application route");
        }

        if config.http.disable_cache_on_get {
            router = router.layer(middleware::from_fn(disable_cache_on_get_requests));
        }

        let metrics = HttpMetrics::new(registry.clone(), routes)?;
        router = bind_standard_middleware(router, &config.http.health_path, metrics);

        // Mounted after the stack: scrapes are neither logged nor counted.
        if mount_metrics {
            router = router.route(metrics_path, get(render_metrics).with_state(registry));
        }

        Ok(Self { router, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The fully assembled router, for driving the server without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until Ctrl-C or a message on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
