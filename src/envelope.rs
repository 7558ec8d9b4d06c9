//! Generated MCP binary-wire types.
//!
//! `build.rs` compiles `proto/mcp.proto` with `prost-build`; this module
//! just brings the generated types into scope under a stable path so the
//! rest of the crate doesn't need to know the package name prost picked.

include!(concat!(env!("OUT_DIR"), "/protomcp.v1.rs"));

impl McpEnvelope {
    pub fn new(id: i64, payload: mcp_envelope::Payload) -> Self {
        Self {
            id,
            payload: Some(payload),
        }
    }
}

impl CallToolResponse {
    pub fn success(content: Vec<u8>) -> Self {
        Self {
            result: Some(call_tool_response::Result::Success(
                call_tool_response::Success { content },
            )),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            result: Some(call_tool_response::Result::Error(
                call_tool_response::Error {
                    code,
                    message: message.into(),
                },
            )),
        }
    }
}
