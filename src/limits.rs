//! Resource bounds enforced by the framing, session, cache, and JSON layers.
//!
//! These are the concrete numbers named in §5 of the system's resource
//! model: message size, session memory, descriptor cache size, and the
//! JSON `Content-Length` body cap.

use serde::{Deserialize, Serialize};

/// Configuration for resource bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum size of a single binary-framed message, in bytes.
    pub max_message_size: usize,

    /// Maximum cumulative decoded-message bytes per binary session before
    /// the session is terminated with `SessionMemoryExceeded`.
    pub max_session_memory: usize,

    /// Maximum number of entries in the descriptor LRU cache.
    pub max_cache_size: usize,

    /// Maximum body size accepted for an LSP-style `Content-Length` frame.
    pub max_json_body_size: usize,

    /// Maximum bytes of a schema-registry error body echoed into logs or
    /// error messages.
    pub max_error_body_sample: usize,

    /// Maximum repositories descriptor-fetched per `Search` call.
    pub max_search_repositories: usize,

    /// Maximum candidate messages emitted per repository by `Search`.
    pub max_search_messages_per_repo: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_message_size: 32 * 1024 * 1024,
            max_session_memory: 256 * 1024 * 1024,
            max_cache_size: 100,
            max_json_body_size: 100 * 1024 * 1024,
            max_error_body_sample: 8 * 1024,
            max_search_repositories: 20,
            max_search_messages_per_repo: 3,
        }
    }
}

impl ResourceLimits {
    /// Small bounds suited to unit tests that want to exercise eviction
    /// and overflow paths without allocating real megabytes.
    pub fn strict() -> Self {
        Self {
            max_message_size: 4096,
            max_session_memory: 16 * 1024,
            max_cache_size: 4,
            max_json_body_size: 8192,
            max_error_body_sample: 256,
            max_search_repositories: 2,
            max_search_messages_per_repo: 1,
        }
    }
}
