//! `protomcp-server` — stdio entry point.
//!
//! Wires stdin/stdout into the [`Router`], which sniffs the session's wire
//! protocol and hands it to the binary or JSON-RPC handler. Both handlers
//! share one [`Registry`] and one [`Resolver`]. No CLI flag parsing or
//! process-lifecycle management lives here — both are explicitly out of
//! scope for this crate's core.

use anyhow::Result;
use protomcp::binary::BinaryHandler;
use protomcp::json::JsonRpcHandler;
use protomcp::limits::ResourceLimits;
use protomcp::logging;
use protomcp::registry::Registry;
use protomcp::router::Router;
use protomcp::schema::{RegistryClient, Resolver, REGISTRY_HOST};
use protomcp::sniffer::Protocol;
use std::sync::Arc;

const SERVER_NAME: &str = "protomcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("protomcp=info,info")
        .init();
    tracing::info!("{}", logging::fmt_server_startup());

    let limits = ResourceLimits::default();
    let registry = Arc::new(Registry::new());

    let client = RegistryClient::new(format!("https://{REGISTRY_HOST}"), limits.max_error_body_sample)?;
    let resolver = Arc::new(
        Resolver::new(client, limits.max_cache_size)
            .with_search_bounds(limits.max_search_repositories, limits.max_search_messages_per_repo),
    );

    let mut router = Router::new();
    router.register(
        Protocol::Binary,
        Arc::new(BinaryHandler::new(registry.clone(), limits.clone())),
    );
    router.register(
        Protocol::Json,
        Arc::new(JsonRpcHandler::new(
            registry,
            Some(resolver),
            limits,
            SERVER_NAME,
            SERVER_VERSION,
        )),
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let result = router.route(stdin, stdout).await;

    tracing::info!("{}", logging::fmt_server_shutdown());
    result.map_err(Into::into)
}
