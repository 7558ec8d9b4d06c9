//! The unified tool registry: registration, aliasing, scored search,
//! pagination, and dispatch.

mod alias;
mod search;

use crate::error::{McpError, McpResult};
use dashmap::DashMap;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub use search::ScoredEntry;

/// A named executable unit, identified by `name` and typed by an opaque
/// schema reference into the remote registry.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// The schema reference string identifying this tool's argument type,
    /// if it has one. Tools without a reference pass raw JSON/bytes
    /// through unchanged.
    pub schema_source: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema_source: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_schema_reference(mut self, reference: impl Into<String>) -> Self {
        self.schema_source = Some(reference.into());
        self
    }
}

/// Boxed async tool handler: takes the raw (binary-encoded, or passthrough
/// JSON-as-bytes) argument bytes and returns content bytes.
pub type ToolFunction = Arc<
    dyn Fn(Vec<u8>) -> Pin<Box<dyn Future<Output = McpResult<Vec<u8>>> + Send>> + Send + Sync,
>;

#[derive(Clone)]
pub struct ToolEntry {
    pub tool: Tool,
    pub handler: ToolFunction,
    pub category: String,
    pub tags: Vec<String>,
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("tool", &self.tool)
            .field("category", &self.category)
            .field("tags", &self.tags)
            .finish()
    }
}

/// A single page of results plus an opaque cursor for the next page.
pub struct Page {
    pub items: Vec<ScoredEntry>,
    pub next_cursor: Option<String>,
}

/// Stores tools with categories/tags/aliases, resolves lookups, scores
/// queries, paginates results, and dispatches calls.
///
/// Registration is not itself serialized against concurrent readers: per
/// the concurrency model, registrations must happen-before any concurrent
/// call that observes the tool, which callers arrange (typically by
/// registering everything during startup).
#[derive(Default)]
pub struct Registry {
    tools: DashMap<String, ToolEntry>,
    aliases: DashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under its canonical name, replacing any existing
    /// entry of the same name (last-writer-wins), then derives and
    /// registers its snake_case alias if the name has any upper-case
    /// character and the derived form differs from the canonical.
    pub fn register(
        &self,
        tool: Tool,
        handler: ToolFunction,
        category: impl Into<String>,
        tags: Vec<String>,
    ) {
        let name = tool.name.clone();
        let entry = ToolEntry {
            tool,
            handler,
            category: category.into(),
            tags,
        };
        self.tools.insert(name.clone(), entry);

        if let Some(derived) = alias::derive_alias(&name) {
            // Best-effort: an explicit alias collision here should not
            // prevent registration of the canonical tool itself.
            if let Err(e) = self.register_alias(&name, &derived) {
                warn!("auto-alias registration skipped for {name}: {e}");
            }
        }
    }

    /// Registers `alias` as a secondary name for `canonical`.
    pub fn register_alias(&self, canonical: &str, alias: &str) -> McpResult<()> {
        if canonical.is_empty() || alias.is_empty() {
            return Err(McpError::Internal("alias names must be non-empty".into()));
        }
        if !self.tools.contains_key(canonical) {
            return Err(McpError::ToolNotFound(canonical.to_string()));
        }
        if self.tools.contains_key(alias) {
            return Err(McpError::Internal(format!(
                "alias {alias} collides with an existing canonical tool name"
            )));
        }
        if self.aliases.contains_key(alias) {
            return Err(McpError::Internal(format!("alias {alias} is already bound")));
        }
        self.aliases.insert(alias.to_string(), canonical.to_string());
        Ok(())
    }

    fn resolve_canonical(&self, name: &str) -> Option<String> {
        if self.tools.contains_key(name) {
            return Some(name.to_string());
        }
        self.aliases.get(name).map(|c| c.clone())
    }

    pub fn get_tool(&self, name: &str) -> Option<ToolEntry> {
        let canonical = self.resolve_canonical(name)?;
        self.tools.get(&canonical).map(|e| e.clone())
    }

    /// Resolves `name` via alias then canonical table, then invokes the
    /// handler. Logs resolved name, input name, elapsed time, and status.
    pub async fn call(&self, name: &str, args: Vec<u8>) -> McpResult<Vec<u8>> {
        let start = Instant::now();
        let canonical = match self.resolve_canonical(name) {
            Some(c) => c,
            None => {
                info!(input = name, "tool lookup miss");
                return Err(McpError::ToolNotFound(name.to_string()));
            }
        };
        let entry = match self.tools.get(&canonical) {
            Some(e) => e.clone(),
            None => return Err(McpError::ToolNotFound(name.to_string())),
        };

        let result = (entry.handler)(args).await;
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => info!(resolved = %canonical, input = name, ?elapsed, "tool call ok"),
            Err(e) => info!(resolved = %canonical, input = name, ?elapsed, error = %e, "tool call failed"),
        }
        result
    }

    /// Linearly scans registered tools for the first one whose
    /// `schema_source` equals `reference`. The open question of
    /// first-match-vs-uniqueness is resolved in DESIGN.md in favor of
    /// first match, matching this scan order.
    pub async fn call_by_reference(&self, reference: &str, args: Vec<u8>) -> McpResult<Vec<u8>> {
        let found = self.tools.iter().find_map(|entry| {
            if entry.tool.schema_source.as_deref() == Some(reference) {
                Some(entry.tool.name.clone())
            } else {
                None
            }
        });
        match found {
            Some(name) => self.call(&name, args).await,
            None => Err(McpError::ToolNotFound(format!(
                "no tool registered for reference {reference}"
            ))),
        }
    }

    /// Scored free-text or `category:`/`integration:` search, expanding
    /// each matched canonical entry into one clone per alias.
    pub fn list(&self, query: &str) -> Vec<ScoredEntry> {
        let alias_map: HashMap<String, Vec<String>> = {
            let mut m: HashMap<String, Vec<String>> = HashMap::new();
            for entry in self.aliases.iter() {
                m.entry(entry.value().clone()).or_default().push(entry.key().clone());
            }
            m
        };

        let mut results = Vec::new();
        for entry in self.tools.iter() {
            let canonical = entry.key();
            let aliases = alias_map.get(canonical).cloned().unwrap_or_default();
            results.extend(search::score_and_expand(entry.value(), canonical, &aliases, query));
        }
        search::sort_results(&mut results);
        results
    }

    /// Paginates `list(query)`. `page_size <= 0` defaults to 50. An
    /// unrecognized cursor falls back to the start of the list.
    pub fn list_paginated(&self, query: &str, page_size: i64, cursor: Option<&str>) -> Page {
        let page_size = if page_size <= 0 { 50 } else { page_size as usize };
        let all = self.list(query);

        let start = match cursor {
            Some(c) => all.iter().position(|e| e.name == c).unwrap_or(0),
            None => 0,
        };

        let end = (start + page_size).min(all.len());
        let items = all[start..end].to_vec();
        let next_cursor = all.get(end).map(|e| e.name.clone());

        Page { items, next_cursor }
    }
}
