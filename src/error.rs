use serde_json::Value;
use thiserror::Error;

/// Error taxonomy for the whole crate. Variants map 1:1 onto the error
/// kinds surfaced by the frame codec, the JSON-RPC handler, the registry,
/// and the schema resolver.
#[derive(Debug, Error)]
pub enum McpError {
    // Framing errors
    #[error("invalid framing: {0}")]
    InvalidFraming(String),

    #[error("message too large: {0} bytes (max: {1})")]
    MessageTooLarge(usize, usize),

    #[error("short read: expected {0} bytes, stream ended")]
    ShortRead(usize),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    // Reference / schema errors
    #[error("invalid schema reference: {0}")]
    InvalidReference(String),

    #[error("type not found: {0}")]
    TypeNotFound(String),

    #[error("schema registry unreachable: {0}")]
    RegistryUnreachable(String),

    #[error("schema registry returned status {status}: {body}")]
    RegistryStatus { status: u16, body: String },

    // Registry / dispatch errors
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("handler error: {0}")]
    HandlerError(String),

    #[error("session memory exceeded: {used} bytes used, max {max}")]
    SessionMemoryExceeded { used: usize, max: usize },

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("unsupported message type")]
    UnsupportedMessage,

    // Ambient
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// JSON-RPC error code for this variant, per the error table in §7.
    pub fn error_code(&self) -> i32 {
        match self {
            Self::UnsupportedMethod(_) | Self::UnsupportedMessage => -32601,
            Self::ToolNotFound(_) => -32601,
            Self::Json(_) => -32700,
            _ => -32603,
        }
    }

    /// Binary-frame error code. Unrecognized payload variants are `-32601`;
    /// everything else a tool call can fail with is `-32603`.
    pub fn binary_code(&self) -> i32 {
        match self {
            Self::UnsupportedMessage => -32601,
            _ => -32603,
        }
    }

    pub fn to_json_rpc_error(&self, id: Option<Value>) -> Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            },
            "id": id,
        })
    }
}

impl From<anyhow::Error> for McpError {
    fn from(err: anyhow::Error) -> Self {
        McpError::Internal(err.to_string())
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_method_maps_to_32601() {
        assert_eq!(McpError::UnsupportedMethod("foo".into()).error_code(), -32601);
    }

    #[test]
    fn handler_error_maps_to_32603() {
        assert_eq!(McpError::HandlerError("boom".into()).error_code(), -32603);
    }

    #[test]
    fn registry_status_message_includes_status() {
        let err = McpError::RegistryStatus {
            status: 503,
            body: "unavailable".into(),
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn json_rpc_error_envelope_echoes_id() {
        let err = McpError::ToolNotFound("demo".into());
        let v = err.to_json_rpc_error(Some(Value::from(7)));
        assert_eq!(v["id"], 7);
        assert_eq!(v["error"]["code"], -32601);
    }
}
