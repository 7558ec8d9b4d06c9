//! The JSON-RPC MCP state machine: `initialize`, `tools/list`, and
//! `tools/call` (including the three meta-tools that expose the dynamic
//! schema system).

use super::framing::read_request;
use super::rpc::{CallToolMetaParams, RawRequest, ResolveSchemaParams, SearchRegistryParams, ToolCallParams};
use crate::error::{McpError, McpResult};
use crate::limits::ResourceLimits;
use crate::logging::{SessionId, SessionLogger};
use crate::registry::Registry;
use crate::router::Handler;
use crate::schema::Resolver;
use crate::transcode;
use async_trait::async_trait;
use prost_reflect::MessageDescriptor;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

fn meta_tool_descriptors() -> Vec<Value> {
    vec![
        json!({
            "name": "search_registry",
            "description": "Search the remote schema registry for candidate messages.",
            "inputSchema": {
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": []
            }
        }),
        json!({
            "name": "resolve_schema",
            "description": "Resolve a schema reference to its JSON-Schema view.",
            "inputSchema": {
                "type": "object",
                "properties": { "bsr_ref": { "type": "string" } },
                "required": ["bsr_ref"]
            }
        }),
        json!({
            "name": "call_tool",
            "description": "Resolve a schema reference, transcode arguments, and invoke a tool.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "bsr_ref": { "type": "string" },
                    "tool_name": { "type": "string" },
                    "arguments": { "type": "object" }
                },
                "required": ["bsr_ref", "arguments"]
            }
        }),
    ]
}

pub struct JsonRpcHandler {
    registry: Arc<Registry>,
    resolver: Option<Arc<Resolver>>,
    limits: ResourceLimits,
    server_name: String,
    server_version: String,
}

impl JsonRpcHandler {
    pub fn new(
        registry: Arc<Registry>,
        resolver: Option<Arc<Resolver>>,
        limits: ResourceLimits,
        server_name: impl Into<String>,
        server_version: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            resolver,
            limits,
            server_name: server_name.into(),
            server_version: server_version.into(),
        }
    }

    async fn dispatch(&self, req: &RawRequest<'_>) -> McpResult<Value> {
        match req.method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": { "name": self.server_name, "version": self.server_version },
            })),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => {
                let params: ToolCallParams = req.params_value().and_then(|v| {
                    serde_json::from_value(v).map_err(McpError::Json)
                })?;
                self.call_tool(&params.name, params.arguments).await
            }
            other => Err(McpError::UnsupportedMethod(other.to_string())),
        }
    }

    fn list_tools(&self) -> Value {
        let mut tools = meta_tool_descriptors();
        for scored in self.registry.list("") {
            // `list("")` clones canonical entries under each alias too;
            // the JSON view renders the canonical entry once.
            if scored.name != scored.entry.tool.name {
                continue;
            }
            tools.push(json!({
                "name": scored.entry.tool.name,
                "description": scored.entry.tool.description,
                "bsr_ref": scored.entry.tool.schema_source,
                "inputSchema": { "type": "object" },
            }));
        }
        json!({ "tools": tools })
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<Value> {
        match name {
            "search_registry" => {
                let params: SearchRegistryParams = serde_json::from_value(arguments)?;
                let query = if params.query.is_empty() { "mcp".to_string() } else { params.query };
                let resolver = self.resolver_or_err()?;
                let registry = self.registry.clone();
                let candidates = resolver
                    .search(&query, "mcp", |reference| {
                        registry
                            .list("")
                            .into_iter()
                            .filter(|s| s.entry.tool.schema_source.as_deref() == Some(reference))
                            .map(|s| s.name)
                            .collect()
                    }, None)
                    .await?;
                Ok(content_block(&serde_json::to_string_pretty(&candidates)?))
            }
            "resolve_schema" => {
                let params: ResolveSchemaParams = serde_json::from_value(arguments)?;
                let resolver = self.resolver_or_err()?;
                let descriptor = resolver.resolve(&params.bsr_ref, None).await?;
                let schema = transcode::message_to_json_schema(&descriptor);
                Ok(content_block(&serde_json::to_string_pretty(&schema)?))
            }
            "call_tool" => {
                let params: CallToolMetaParams = serde_json::from_value(arguments)?;
                let resolver = self.resolver_or_err()?;
                let descriptor = resolver.resolve(&params.bsr_ref, None).await?;
                let binary_args = transcode::json_to_binary(&descriptor, &params.arguments)?;
                let result = match &params.tool_name {
                    Some(tool_name) => self.registry.call(tool_name, binary_args).await?,
                    None => self.registry.call_by_reference(&params.bsr_ref, binary_args).await?,
                };
                render_result(Some(&descriptor), &result)
            }
            _ => {
                let entry = match self.registry.get_tool(name) {
                    Some(e) => e,
                    None => return Err(McpError::ToolNotFound(name.to_string())),
                };
                let descriptor = match (&self.resolver, &entry.tool.schema_source) {
                    (Some(resolver), Some(reference)) => Some(resolver.resolve(reference, None).await?),
                    _ => None,
                };
                let payload = match &descriptor {
                    Some(descriptor) => transcode::json_to_binary(descriptor, &arguments)?,
                    None => serde_json::to_vec(&arguments)?,
                };
                let result = self.registry.call(name, payload).await?;
                render_result(descriptor.as_ref(), &result)
            }
        }
    }

    fn resolver_or_err(&self) -> McpResult<Arc<Resolver>> {
        self.resolver
            .clone()
            .ok_or_else(|| McpError::Internal("no schema resolver configured".into()))
    }
}

fn content_block(text: &str) -> Value {
    json!({ "content": [ { "type": "text", "text": text } ] })
}

/// Renders a tool result for the `content` block. When the tool carries a
/// schema reference, `result` is the binary wire form of that type and is
/// transcoded back to JSON; otherwise it's rendered as raw text, matching
/// what was sent when no descriptor was available to encode the request.
fn render_result(descriptor: Option<&MessageDescriptor>, result: &[u8]) -> McpResult<Value> {
    match descriptor {
        Some(descriptor) => {
            let decoded = transcode::binary_to_json(descriptor, result)?;
            Ok(content_block(&serde_json::to_string_pretty(&decoded)?))
        }
        None => Ok(content_block(&String::from_utf8_lossy(result))),
    }
}

#[async_trait]
impl Handler for JsonRpcHandler {
    async fn handle(
        &self,
        reader: Box<dyn AsyncRead + Send + Unpin>,
        mut writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> McpResult<()> {
        let mut reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(BufReader::new(reader));
        let logger = SessionLogger::new(SessionId::new());

        loop {
            let body = match read_request(&mut reader, self.limits.max_json_body_size).await {
                Ok(Some(body)) => body,
                Ok(None) => break,
                Err(e) => {
                    // A parse/framing error on one request does not end
                    // the session; only the request itself fails.
                    info!("{}", e);
                    continue;
                }
            };

            let response = match RawRequest::from_slice(&body) {
                Ok(req) => {
                    info!("{}", logger.fmt_request_received(req.method, &req.id_value().to_string()));
                    let id = req.id_value();
                    match self.dispatch(&req).await {
                        Ok(result) => json!({ "jsonrpc": "2.0", "result": result, "id": id }),
                        Err(e) => e.to_json_rpc_error(Some(id)),
                    }
                }
                Err(e) => e.to_json_rpc_error(None),
            };

            let bytes = serde_json::to_vec(&response)?;
            writer.write_all(&bytes).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            info!("{}", logger.fmt_response_sent(bytes.len()));
        }

        info!("{}", logger.fmt_session_closed());
        Ok(())
    }
}
