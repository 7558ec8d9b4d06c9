//! Parsing for `registry-host/owner/repository/fully.qualified.Message[:version]`.

use crate::error::{McpError, McpResult};

pub const REGISTRY_HOST: &str = "buf.build";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReference {
    pub owner: String,
    pub repository: String,
    pub message: String,
    pub version: String,
}

impl SchemaReference {
    pub fn cache_key(&self) -> String {
        format!("{}/{}@{}", self.owner, self.repository, self.version)
    }
}

/// Parses `s` into a [`SchemaReference`]. Fails with `InvalidReference`
/// when the fixed host prefix is missing or fewer than three
/// slash-separated parts follow it.
pub fn parse_reference(s: &str) -> McpResult<SchemaReference> {
    let prefix = format!("{REGISTRY_HOST}/");
    let rest = s.strip_prefix(&prefix).ok_or_else(|| {
        McpError::InvalidReference(format!("missing `{prefix}` prefix: {s}"))
    })?;

    let parts: Vec<&str> = rest.split('/').collect();
    if parts.len() < 3 {
        return Err(McpError::InvalidReference(format!(
            "expected owner/repository/message[:version], got: {rest}"
        )));
    }

    let owner = parts[0].to_string();
    let repository = parts[1].to_string();
    let message_and_version = parts[2..].join("/");

    let (message, version) = match message_and_version.split_once(':') {
        Some((m, v)) => (m.to_string(), v.to_string()),
        None => (message_and_version, "main".to_string()),
    };

    if owner.is_empty() || repository.is_empty() || message.is_empty() {
        return Err(McpError::InvalidReference(format!(
            "owner, repository, and message must be non-empty: {s}"
        )));
    }

    Ok(SchemaReference {
        owner,
        repository,
        message,
        version,
    })
}
