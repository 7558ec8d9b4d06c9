//! Zero-copy JSON-RPC 2.0 request parsing.
//!
//! Mirrors the borrowed-`RawValue` pattern used elsewhere in this crate's
//! handlers: the envelope is parsed once, params stay as a borrowed raw
//! slice until a specific method's handler needs them, avoiding an
//! allocation for requests whose params are never inspected.

use crate::error::{McpError, McpResult};
use serde::Deserialize;
use serde_json::value::RawValue;

/// A parsed-but-not-yet-dispatched JSON-RPC request. `id` and `params`
/// stay borrowed from the original buffer until consumed.
#[derive(Debug, Deserialize)]
pub struct RawRequest<'a> {
    pub jsonrpc: &'a str,
    #[serde(borrow)]
    pub id: Option<&'a RawValue>,
    pub method: &'a str,
    #[serde(borrow)]
    pub params: Option<&'a RawValue>,
}

impl<'a> RawRequest<'a> {
    pub fn from_slice(bytes: &'a [u8]) -> McpResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| McpError::MalformedMessage(e.to_string()))?;
        let req: RawRequest = serde_json::from_str(text)?;
        req.validate()?;
        Ok(req)
    }

    fn validate(&self) -> McpResult<()> {
        if self.jsonrpc != "2.0" {
            return Err(McpError::MalformedMessage(format!(
                "unsupported jsonrpc version: {}",
                self.jsonrpc
            )));
        }
        if self.method.is_empty() {
            return Err(McpError::MalformedMessage("empty method name".into()));
        }
        Ok(())
    }

    pub fn id_value(&self) -> serde_json::Value {
        match self.id {
            Some(raw) => serde_json::from_str(raw.get()).unwrap_or(serde_json::Value::Null),
            None => serde_json::Value::Null,
        }
    }

    pub fn params_value(&self) -> McpResult<serde_json::Value> {
        match self.params {
            Some(raw) => serde_json::from_str(raw.get()).map_err(McpError::Json),
            None => Ok(serde_json::Value::Null),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct SearchRegistryParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveSchemaParams {
    pub bsr_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct CallToolMetaParams {
    pub bsr_ref: String,
    pub tool_name: Option<String>,
    #[serde(default)]
    pub arguments: serde_json::Value,
}
