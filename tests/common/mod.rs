//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use http_utils::{
    config::ServiceConfig, reply_json, HttpServer, JsonReply, MetricsRegistry, RequestContext,
    ServiceRouter, Shutdown, StrictJson,
};

#[derive(Debug, Deserialize)]
pub struct Order {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct Receipt {
    pub sku: String,
    pub quantity: u32,
}

impl JsonReply for Receipt {}

/// A running server; dropping it stops the server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub registry: Arc<MetricsRegistry>,
    shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

async fn place_order(ctx: RequestContext, StrictJson(order): StrictJson<Order>) -> Response {
    let receipt = Receipt {
        sku: order.sku,
        quantity: order.quantity,
    };
    reply_json(ctx.request_id(), StatusCode::CREATED, &receipt)
}

async fn no_orders(ctx: RequestContext) -> Response {
    let orders: Vec<Receipt> = Vec::new();
    reply_json(ctx.request_id(), StatusCode::OK, &orders)
}

async fn cached() -> Response {
    ([(header::CACHE_CONTROL, "max-age=60")], "cached").into_response()
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

pub fn app() -> ServiceRouter {
    ServiceRouter::new()
        .route("/orders", post(place_order).get(no_orders))
        .route("/orders/{id}", get(|| async { "order" }))
        .route("/cached", get(cached))
        .route("/explode", get(explode))
}

/// Start the demo app with `config` on an ephemeral port.
pub async fn spawn_app_with(config: ServiceConfig) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let registry = Arc::new(MetricsRegistry::new().unwrap());
    let server = HttpServer::new(config, app(), registry.clone()).unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestApp {
        addr,
        registry,
        shutdown,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(ServiceConfig::default()).await
}
