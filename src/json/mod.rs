//! The JSON-RPC wire protocol: request framing (newline- or
//! `Content-Length`-delimited), zero-copy request parsing, and the MCP
//! method dispatch table.

mod framing;
pub mod handler;
mod rpc;

pub use handler::{JsonRpcHandler, PROTOCOL_VERSION};
pub use rpc::{CallToolMetaParams, RawRequest, ResolveSchemaParams, SearchRegistryParams, ToolCallParams};
