//! Demo service built on the standard stack.
//!
//! Serves a small in-memory item store and a JSON echo endpoint:
//!
//! ```text
//! POST /v1/echo          echo a message back with the request id
//! GET  /v1/items         list items ([] when there are none)
//! POST /v1/items         create an item
//! GET  /v1/items/{id}    fetch one item
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use http_utils::config::{load_config, ServiceConfig};
use http_utils::observability::init_logging;
use http_utils::{
    reply_json, HttpServer, JsonReply, MetricsRegistry, RequestContext, ServiceRouter, Shutdown,
    StrictJson,
};

#[derive(Parser, Debug)]
#[command(name = "http-utils", about = "Demo service for the standard HTTP stack")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct EchoRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct EchoReply<'a> {
    message: String,
    request_id: Option<&'a str>,
}

impl JsonReply for EchoReply<'_> {}

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
    #[serde(default)]
    quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Item {
    id: u64,
    name: String,
    quantity: u32,
}

impl JsonReply for Item {}

#[derive(Clone, Default)]
struct AppState {
    items: Arc<RwLock<BTreeMap<u64, Item>>>,
    next_id: Arc<AtomicU64>,
}

async fn echo(ctx: RequestContext, StrictJson(request): StrictJson<EchoRequest>) -> Response {
    let reply = EchoReply {
        message: request.message,
        request_id: ctx.request_id(),
    };
    reply_json(ctx.request_id(), StatusCode::OK, &reply)
}

async fn list_items(State(state): State<AppState>, ctx: RequestContext) -> Response {
    let items: Vec<Item> = state
        .items
        .read()
        .expect("item store lock poisoned")
        .values()
        .cloned()
        .collect();
    reply_json(ctx.request_id(), StatusCode::OK, &items)
}

async fn create_item(
    State(state): State<AppState>,
    ctx: RequestContext,
    StrictJson(new_item): StrictJson<NewItem>,
) -> Response {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    let item = Item {
        id,
        name: new_item.name,
        quantity: new_item.quantity,
    };
    state
        .items
        .write()
        .expect("item store lock poisoned")
        .insert(id, item.clone());

    tracing::info!(request_id = ctx.request_id(), item_id = id, "item created");
    reply_json(ctx.request_id(), StatusCode::CREATED, &item)
}

async fn get_item(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<u64>,
) -> Response {
    let item = state
        .items
        .read()
        .expect("item store lock poisoned")
        .get(&id)
        .cloned();
    match item {
        Some(item) => reply_json(ctx.request_id(), StatusCode::OK, &item),
        None => (StatusCode::NOT_FOUND, "item not found").into_response(),
    }
}

fn app() -> ServiceRouter {
    ServiceRouter::<AppState>::new()
        .route("/v1/echo", post(echo))
        .route("/v1/items", get(list_items).post(create_item))
        .route("/v1/items/{id}", get(get_item))
        .with_state(AppState::default())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        health_path = %config.http.health_path,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    let registry = Arc::new(MetricsRegistry::new()?);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, app(), registry)?;

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
