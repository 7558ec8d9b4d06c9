//! # protomcp
//!
//! `protomcp` is the core of a Model Context Protocol (MCP) server: a
//! dual-protocol stdio frontend that sniffs whether a session speaks a
//! length-prefixed binary wire or line/LSP-framed JSON-RPC, decodes either
//! one, and dispatches into a single [`registry::Registry`] of named,
//! schema-typed tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Router                      │  ← sniffs JSON vs binary
//! ├───────────────────┬───────────────────────┤
//! │   BinaryHandler    │    JsonRpcHandler     │  ← MCP state machines
//! ├───────────────────┴───────────────────────┤
//! │              Registry                     │  ← tools, aliases, search
//! ├─────────────────────────────────────────┤
//! │              Resolver                     │  ← schema registry client,
//! │                                            │    descriptor cache, pool
//! └─────────────────────────────────────────┘
//! ```
//!
//! The binary wire carries a fixed [`envelope::McpEnvelope`] (generated
//! from `proto/mcp.proto`); the JSON-RPC wire carries `tools/call`
//! arguments as plain JSON, which the [`transcode`] module converts to and
//! from the binary form of a dynamically resolved schema.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use protomcp::binary::BinaryHandler;
//! use protomcp::json::JsonRpcHandler;
//! use protomcp::limits::ResourceLimits;
//! use protomcp::registry::Registry;
//! use protomcp::router::Router;
//! use protomcp::schema::{RegistryClient, Resolver, REGISTRY_HOST};
//! use protomcp::sniffer::Protocol;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let limits = ResourceLimits::default();
//! let registry = Arc::new(Registry::new());
//! let client = RegistryClient::new(format!("https://{REGISTRY_HOST}"), limits.max_error_body_sample)?;
//! let resolver = Arc::new(Resolver::new(client, limits.max_cache_size));
//!
//! let mut router = Router::new();
//! router.register(Protocol::Binary, Arc::new(BinaryHandler::new(registry.clone(), limits.clone())));
//! router.register(Protocol::Json, Arc::new(JsonRpcHandler::new(registry, Some(resolver), limits, "protomcp", "0.1.0")));
//!
//! router.route(tokio::io::stdin(), tokio::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod envelope;
pub mod error;
pub mod framing;
pub mod json;
pub mod limits;
pub mod logging;
pub mod registry;
pub mod router;
pub mod schema;
pub mod sniffer;
pub mod transcode;

pub use crate::error::{McpError, McpResult};
pub use crate::limits::ResourceLimits;
pub use crate::registry::{Registry, Tool, ToolEntry, ToolFunction};
pub use crate::router::Router;
