//! End-to-end binary-wire sessions driven through the `Router`, not the
//! handler directly — exercises sniffing, framing, dispatch, and the
//! session-memory guard together the way a real stdio client would see
//! them.

mod common;

use common::SharedWriter;
use protomcp::binary::BinaryHandler;
use protomcp::envelope::{
    call_tool_response, mcp_envelope::Payload, CallToolRequest, InitializeRequest,
    ListToolsRequest, McpEnvelope,
};
use protomcp::framing::{read_envelope, write_envelope};
use protomcp::registry::{Registry, Tool};
use protomcp::router::Router;
use protomcp::sniffer::Protocol;
use protomcp::ResourceLimits;
use std::io::Cursor;
use std::sync::Arc;

fn router_with(registry: Arc<Registry>, limits: ResourceLimits) -> Router {
    let mut router = Router::new();
    router.register(Protocol::Binary, Arc::new(BinaryHandler::new(registry, limits)));
    router
}

async fn send(router: &Router, requests: &[McpEnvelope]) -> Vec<McpEnvelope> {
    let mut input = Vec::new();
    for req in requests {
        write_envelope(&mut input, req).await.unwrap();
    }

    let output = SharedWriter::new();
    router
        .route(Cursor::new(input), output.clone())
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
async fn initialize_round_trips_through_the_sniffer_and_router() {
    let router = router_with(Arc::new(Registry::new()), ResourceLimits::default());
    let request = McpEnvelope::new(
        1,
        Payload::InitializeRequest(InitializeRequest {
            protocol_version: "1.0.0".into(),
        }),
    );

    let replies = send(&router, &[request]).await;
    assert_eq!(replies.len(), 1);
    match replies[0].payload.as_ref().unwrap() {
        Payload::InitializeResponse(r) => assert_eq!(r.protocol_version, "1.0.0"),
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn list_tools_surfaces_both_the_canonical_name_and_its_derived_alias() {
    let registry = Arc::new(Registry::new());
    registry.register(
        Tool::new("CreateIssue", "opens an issue in the tracker"),
        Arc::new(|_args| Box::pin(async { Ok(Vec::new()) })),
        "trackers",
        vec!["beta".to_string()],
    );
    let router = router_with(registry, ResourceLimits::default());

    let request = McpEnvelope::new(
        1,
        Payload::ListToolsRequest(ListToolsRequest { query: String::new() }),
    );
    let replies = send(&router, &[request]).await;

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
async fn calling_a_tool_by_its_alias_dispatches_to_the_canonical_handler() {
    let registry = Arc::new(Registry::new());
    registry.register(
        Tool::new("Echo", "echoes its argument bytes"),
        Arc::new(|args| Box::pin(async move { Ok(args) })),
        "demo",
        vec![],
    );
    let router = router_with(registry, ResourceLimits::default());

    let request = McpEnvelope::new(
        5,
        Payload::CallToolRequest(CallToolRequest {
            name: "echo".into(),
            arguments: b"hello".to_vec(),
        }),
    );
    let replies = send(&router, &[request]).await;

    match replies[0].payload.as_ref().unwrap() {
        Payload::CallToolResponse(r) => match r.result.as_ref().unwrap() {
            call_tool_response::Result::Success(s) => assert_eq!(s.content, b"hello"),
            other => panic!("expected success, got {other:?}"),
        },
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn multiple_requests_in_one_session_are_answered_in_order() {
    let registry = Arc::new(Registry::new());
    let router = router_with(registry, ResourceLimits::default());

    let first = McpEnvelope::new(
        1,
        Payload::InitializeRequest(InitializeRequest {
            protocol_version: "1.0.0".into(),
        }),
    );
    let second = McpEnvelope::new(
        2,
        Payload::ListToolsRequest(ListToolsRequest { query: String::new() }),
    );
    let replies = send(&router, &[first, second]).await;

    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].id, 1);
    assert_eq!(replies[1].id, 2);
}

#[tokio::test]
async fn session_memory_guard_terminates_the_session_after_one_error_frame() {
    let mut limits = ResourceLimits::default();
    limits.max_session_memory = 1;
    let router = router_with(Arc::new(Registry::new()), limits);

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
    let replies = send(&router, &[first, second]).await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, 1);
    match replies[0].payload.as_ref().unwrap() {
        Payload::CallToolResponse(r) => {
            assert!(matches!(r.result, Some(call_tool_response::Result::Error(_))));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}
