//! The binary-wire MCP state machine: reads length-prefixed frames,
//! switches on the envelope's payload variant, and dispatches into the
//! registry.

use crate::envelope::{
    mcp_envelope::Payload, CallToolResponse, InitializeResponse, ListToolsResponse, McpEnvelope,
    ToolDescriptor,
};
use crate::error::{McpError, McpResult};
use crate::framing::{read_envelope, write_envelope};
use crate::limits::ResourceLimits;
use crate::logging::{SessionId, SessionLogger};
use crate::registry::Registry;
use crate::router::Handler;
use async_trait::async_trait;
use prost::Message as _;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

pub const BINARY_PROTOCOL_VERSION: &str = "1.0.0";

/// Loops over one session's frames, dispatching each decoded envelope into
/// the shared [`Registry`] and writing a reply frame in reception order.
pub struct BinaryHandler {
    registry: Arc<Registry>,
    limits: ResourceLimits,
}

impl BinaryHandler {
    pub fn new(registry: Arc<Registry>, limits: ResourceLimits) -> Self {
        Self { registry, limits }
    }

    async fn dispatch(&self, id: i64, payload: Payload) -> Payload {
        match payload {
            Payload::InitializeRequest(_) => Payload::InitializeResponse(InitializeResponse {
                protocol_version: BINARY_PROTOCOL_VERSION.to_string(),
            }),
            Payload::ListToolsRequest(req) => {
                let tools = self
                    .registry
                    .list(&req.query)
                    .into_iter()
                    .map(|scored| ToolDescriptor {
                        name: scored.name,
                        description: scored.entry.tool.description.clone(),
                        bsr_ref: scored.entry.tool.schema_source.clone().unwrap_or_default(),
                    })
                    .collect();
                Payload::ListToolsResponse(ListToolsResponse { tools })
            }
            Payload::CallToolRequest(req) => match self.registry.call(&req.name, req.arguments).await {
                Ok(content) => Payload::CallToolResponse(CallToolResponse::success(content)),
                Err(e) => {
                    info!(id, error = %e, "call_tool failed");
                    Payload::CallToolResponse(CallToolResponse::error(e.binary_code(), e.to_string()))
                }
            },
            _ => {
                let err = McpError::UnsupportedMessage;
                Payload::CallToolResponse(CallToolResponse::error(
                    err.binary_code(),
                    err.to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl Handler for BinaryHandler {
    async fn handle(
        &self,
        mut reader: Box<dyn AsyncRead + Send + Unpin>,
        mut writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> McpResult<()> {
        let logger = SessionLogger::new(SessionId::new());
        let mut memory_used: usize = 0;

        loop {
            let envelope = match read_envelope(&mut reader, self.limits.max_message_size).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => break,
                Err(e) => return Err(e),
            };
            info!("{}", logger.fmt_frame_received(envelope.encoded_len()));

            let Some(payload) = envelope.payload else {
                let err = McpError::UnsupportedMessage;
                let reply = McpEnvelope::new(
                    envelope.id,
                    Payload::CallToolResponse(CallToolResponse::error(
                        err.binary_code(),
                        err.to_string(),
                    )),
                );
                write_envelope(&mut writer, &reply).await?;
                continue;
            };

            // Session memory is accounted on the decoded envelope's size,
            // per spec's Open Question (c) resolution: count decoded
            // bytes, since that is what bounds process RSS.
            memory_used += envelope.encoded_len();
            if memory_used > self.limits.max_session_memory {
                info!(
                    "{}",
                    logger.fmt_session_memory_exceeded(memory_used, self.limits.max_session_memory)
                );
                let err = McpError::SessionMemoryExceeded {
                    used: memory_used,
                    max: self.limits.max_session_memory,
                };
                let reply = McpEnvelope::new(
                    envelope.id,
                    Payload::CallToolResponse(CallToolResponse::error(
                        err.binary_code(),
                        err.to_string(),
                    )),
                );
                write_envelope(&mut writer, &reply).await?;
                break;
            }

            let reply_payload = self.dispatch(envelope.id, payload).await;
            let reply = McpEnvelope::new(envelope.id, reply_payload);
            write_envelope(&mut writer, &reply).await?;
            info!("{}", logger.fmt_response_sent(reply.encoded_len()));
        }

        info!("{}", logger.fmt_session_closed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{CallToolRequest, InitializeRequest, ListToolsRequest};
    use crate::registry::Tool;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use tokio::io::AsyncWrite;

    /// A writable sink backed by a shared, lockable buffer. A clone can be
    /// boxed into the implicitly-`'static` `Box<dyn AsyncWrite + ...>` that
    /// `Handler::handle` expects while a second clone stays in scope to
    /// inspect what was written once `handle` returns.
    #[derive(Clone, Default)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl SharedWriter {
        fn new() -> Self {
            Self::default()
        }

        fn snapshot(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl AsyncWrite for SharedWriter {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn roundtrip(handler: &BinaryHandler, requests: Vec<McpEnvelope>) -> Vec<McpEnvelope> {
        let mut input = Vec::new();
        for req in &requests {
            write_envelope(&mut input, req).await.unwrap();
        }
        // `handle` takes an owned, implicitly `'static` boxed writer, so a
        // borrowed `&mut Vec<u8>` won't coerce; a shared buffer lets us keep
        // a second handle to read the bytes back after `handle` returns.
        let output = SharedWriter::new();
        handler
            .handle(Box::new(Cursor::new(input)), Box::new(output.clone()))
            .await
            .unwrap();

        let mut cursor = Cursor::new(output.snapshot());
        let mut replies = Vec::new();
        while let Some(env) = read_envelope(&mut cursor, usize::MAX).await.unwrap() {
            replies.push(env);
        }
        replies
    }

    #[tokio::test]
    async fn initialize_echoes_id_and_reports_protocol_version() {
        let handler = BinaryHandler::new(Arc::new(Registry::new()), ResourceLimits::default());
        let request = McpEnvelope::new(
            1,
            Payload::InitializeRequest(InitializeRequest {
                protocol_version: "1.0.0".into(),
            }),
        );
        let replies = roundtrip(&handler, vec![request]).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, 1);
        match replies[0].payload.as_ref().unwrap() {
            Payload::InitializeResponse(r) => assert_eq!(r.protocol_version, "1.0.0"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_tools_includes_both_canonical_and_alias_entries() {
        let registry = Arc::new(Registry::new());
        registry.register(
            Tool::new("CreateIssue", "opens an issue"),
            Arc::new(|_args| Box::pin(async { Ok(Vec::new()) })),
            "trackers",
            vec![],
        );
        let handler = BinaryHandler::new(registry, ResourceLimits::default());
        let request = McpEnvelope::new(
            1,
            Payload::ListToolsRequest(ListToolsRequest { query: String::new() }),
        );
        let replies = roundtrip(&handler, vec![request]).await;
        match replies[0].payload.as_ref().unwrap() {
            Payload::ListToolsResponse(r) => {
                let names: Vec<_> = r.tools.iter().map(|t| t.name.as_str()).collect();
                assert!(names.contains(&"CreateIssue"));
                assert!(names.contains(&"create_issue"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn call_tool_on_missing_tool_is_an_error_response_not_a_session_failure() {
        let handler = BinaryHandler::new(Arc::new(Registry::new()), ResourceLimits::default());
        let request = McpEnvelope::new(
            7,
            Payload::CallToolRequest(CallToolRequest {
                name: "missing".into(),
                arguments: vec![],
            }),
        );
        let replies = roundtrip(&handler, vec![request]).await;
        assert_eq!(replies[0].id, 7);
        match replies[0].payload.as_ref().unwrap() {
            Payload::CallToolResponse(r) => match r.result.as_ref().unwrap() {
                crate::envelope::call_tool_response::Result::Error(e) => {
                    assert_eq!(e.code, -32603);
                }
                other => panic!("expected error result, got {other:?}"),
            },
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn session_memory_guard_emits_one_error_frame_then_ends_session() {
        let registry = Arc::new(Registry::new());
        let mut limits = ResourceLimits::default();
        limits.max_session_memory = 1; // first decoded frame already exceeds this
        let handler = BinaryHandler::new(registry, limits);

        let first = McpEnvelope::new(
            1,
            Payload::InitializeRequest(InitializeRequest {
                protocol_version: "1.0.0".into(),
            }),
        );
        let second = McpEnvelope::new(
            2,
            Payload::InitializeRequest(InitializeRequest {
                protocol_version: "1.0.0".into(),
            }),
        );
        let replies = roundtrip(&handler, vec![first, second]).await;

        // Only one error response is emitted, for the request that tipped
        // the session over the limit; the second request is never reached.
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, 1);
        match replies[0].payload.as_ref().unwrap() {
            Payload::CallToolResponse(r) => match r.result.as_ref().unwrap() {
                crate::envelope::call_tool_response::Result::Error(e) => {
                    assert_eq!(e.code, -32603);
                }
                other => panic!("expected error result, got {other:?}"),
            },
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
