//! Connection-scoped structured logging.
//!
//! Mirrors the formatter-function style used throughout this crate: each
//! session gets a short id, and `fmt_*` helpers produce a prefixed string
//! that callers pass straight to `tracing`.

use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct SessionLogger {
    session_id: SessionId,
    start_time: Instant,
}

impl SessionLogger {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            start_time: Instant::now(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn fmt_protocol_detected(&self, protocol: &str) -> String {
        format!("[mcp:{}] 🔎 sniffed protocol: {}", self.session_id.0, protocol)
    }

    pub fn fmt_frame_received(&self, len: usize) -> String {
        format!("[mcp:{}] 📥 binary frame ({} bytes)", self.session_id.0, len)
    }

    pub fn fmt_request_received(&self, method: &str, id: &str) -> String {
        format!("[mcp:{}] 🔍 {} (id={})", self.session_id.0, method, id)
    }

    pub fn fmt_dispatch_start(&self, tool: &str) -> String {
        format!("[mcp:{}] ⚙️  dispatching tool: {}", self.session_id.0, tool)
    }

    pub fn fmt_dispatch_success(&self, tool: &str, duration: Duration) -> String {
        format!("[mcp:{}] ✅ {} completed in {:?}", self.session_id.0, tool, duration)
    }

    pub fn fmt_dispatch_error(&self, tool: &str, error: &str, duration: Duration) -> String {
        format!(
            "[mcp:{}] ❌ {} failed after {:?}: {}",
            self.session_id.0, tool, duration, error
        )
    }

    pub fn fmt_response_sent(&self, size: usize) -> String {
        format!("[mcp:{}] 📤 response ({} bytes)", self.session_id.0, size)
    }

    pub fn fmt_session_memory_exceeded(&self, used: usize, max: usize) -> String {
        format!(
            "[mcp:{}] 💥 session memory exceeded: {} > {}",
            self.session_id.0, used, max
        )
    }

    pub fn fmt_session_closed(&self) -> String {
        format!(
            "[mcp:{}] 🔌 session closed after {:?}",
            self.session_id.0,
            self.start_time.elapsed()
        )
    }
}

pub fn fmt_schema_fetch_start(owner: &str, repository: &str, version: &str) -> String {
    format!("🌐 fetching descriptors for {owner}/{repository}@{version}")
}

pub fn fmt_schema_cache_hit(key: &str) -> String {
    format!("📦 descriptor cache hit: {key}")
}

pub fn fmt_schema_cache_evict(key: &str) -> String {
    format!("🧹 evicting stale descriptor cache entry: {key}")
}

pub fn fmt_server_startup() -> String {
    "🚀 starting protomcp stdio server".to_string()
}

pub fn fmt_server_shutdown() -> String {
    "🛑 protomcp stdio server shutting down".to_string()
}
