//! Ties reference parsing, the descriptor cache, the schema pool, and the
//! registry HTTP client together into `Resolve`/`Unpack`/`Search`.

use super::cache::DescriptorCache;
use super::client::RegistryClient;
use super::pool;
use super::reference::{parse_reference, SchemaReference};
use crate::error::{McpError, McpResult};
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor};
use prost_types::FileDescriptorSet;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

struct ResolverState {
    cache: DescriptorCache,
    pool: DescriptorPool,
}

/// A candidate message surfaced by `Search`, annotated with any currently
/// registered tool that already carries the same reference.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchCandidate {
    pub owner: String,
    pub repository: String,
    pub message: String,
    pub reference: String,
    pub local_tool_names: Vec<String>,
}

/// Fetches schema descriptors from the remote registry on demand, caches
/// them under a bounded LRU, and registers them into a process-wide
/// schema pool. One reader/writer lock guards both the cache and the
/// pool; the network fetch itself happens without the lock held.
pub struct Resolver {
    state: RwLock<ResolverState>,
    client: RegistryClient,
    max_search_repositories: usize,
    max_search_messages_per_repo: usize,
    interesting_tokens: [&'static str; 4],
}

impl Resolver {
    pub fn new(client: RegistryClient, max_cache_size: usize) -> Self {
        Self {
            state: RwLock::new(ResolverState {
                cache: DescriptorCache::new(max_cache_size),
                pool: DescriptorPool::new(),
            }),
            client,
            max_search_repositories: 20,
            max_search_messages_per_repo: 3,
            interesting_tokens: ["Request", "Event", "Task", "Call"],
        }
    }

    pub fn with_search_bounds(mut self, max_repositories: usize, max_messages_per_repo: usize) -> Self {
        self.max_search_repositories = max_repositories;
        self.max_search_messages_per_repo = max_messages_per_repo;
        self
    }

    /// Resolves a reference string to a [`MessageDescriptor`], fetching
    /// and caching descriptor sets as needed.
    pub async fn resolve(&self, reference: &str, deadline: Option<Duration>) -> McpResult<MessageDescriptor> {
        let parsed = parse_reference(reference)?;

        // Hot path: the message is already in the pool (from this or a
        // prior reference resolving the same repository).
        {
            let state = self.state.read().await;
            if let Ok(found) = pool::find_message(&state.pool, &parsed.message) {
                return Ok(found);
            }
        }

        let cache_key = parsed.cache_key();
        let cached_set = {
            let mut state = self.state.write().await;
            state.cache.get(&cache_key).cloned()
        };

        let descriptor_set = match cached_set {
            Some(set) => {
                debug!(key = %cache_key, "descriptor cache hit");
                set
            }
            None => {
                info!(owner = %parsed.owner, repository = %parsed.repository, version = %parsed.version, "fetching descriptors");
                let set = self.fetch_descriptor_set(&parsed, deadline).await?;
                let mut state = self.state.write().await;
                state.cache.insert(cache_key, set.clone());
                set
            }
        };

        {
            let mut state = self.state.write().await;
            pool::register_files(&mut state.pool, descriptor_set.file.clone());
            pool::find_message(&state.pool, &parsed.message)
        }
    }

    async fn fetch_descriptor_set(
        &self,
        reference: &SchemaReference,
        deadline: Option<Duration>,
    ) -> McpResult<FileDescriptorSet> {
        let files = self
            .client
            .get_image(&reference.owner, &reference.repository, &reference.version, deadline)
            .await?;
        Ok(FileDescriptorSet { file: files })
    }

    /// Unpacks an Any-style `{type_url, value}` pair: the trailing segment
    /// of `type_url` after the last `/` is the fully qualified message
    /// name, looked up in the pool and used to binary-decode `value`.
    pub async fn unpack(&self, type_url: &str, value: &[u8]) -> McpResult<DynamicMessage> {
        let name = type_url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| McpError::MalformedMessage(format!("invalid type URL: {type_url}")))?;

        let descriptor = {
            let state = self.state.read().await;
            pool::find_message(&state.pool, name)?
        };

        DynamicMessage::decode(descriptor, value)
            .map_err(|e| McpError::MalformedMessage(e.to_string()))
    }

    /// Searches the registry, fans out descriptor fetches across matching
    /// repositories (bounded by `max_search_repositories`), and returns
    /// candidate request/event/task/call-shaped messages.
    pub async fn search(
        &self,
        query: &str,
        owner_namespace: &str,
        local_reference_lookup: impl Fn(&str) -> Vec<String>,
        deadline: Option<Duration>,
    ) -> McpResult<Vec<SearchCandidate>> {
        let results = self.client.search(query, 50, deadline).await?;

        let mut candidates = Vec::new();
        let matching_repos = results
            .search_results
            .into_iter()
            .filter(|r| r.repository.owner.eq_ignore_ascii_case(owner_namespace))
            .take(self.max_search_repositories);

        for result in matching_repos {
            let owner = result.repository.owner;
            let repository = result.repository.name;
            let set = match self
                .fetch_descriptor_set(
                    &SchemaReference {
                        owner: owner.clone(),
                        repository: repository.clone(),
                        message: String::new(),
                        version: "main".to_string(),
                    },
                    deadline,
                )
                .await
            {
                Ok(set) => set,
                Err(e) => {
                    debug!(owner = %owner, repository = %repository, error = %e, "search descriptor fetch failed, skipping repo");
                    continue;
                }
            };

            let mut emitted = 0usize;
            'files: for file in &set.file {
                for message in &file.message_type {
                    if emitted >= self.max_search_messages_per_repo {
                        break 'files;
                    }
                    let Some(name) = &message.name else { continue };
                    if !self.interesting_tokens.iter().any(|token| name.contains(token)) {
                        continue;
                    }
                    let full_name = format!(
                        "{}.{}",
                        file.package.clone().unwrap_or_default(),
                        name
                    );
                    let reference = format!("{}/{}/{}/{}:main", super::reference::REGISTRY_HOST, owner, repository, full_name);
                    candidates.push(SearchCandidate {
                        owner: owner.clone(),
                        repository: repository.clone(),
                        message: full_name.clone(),
                        local_tool_names: local_reference_lookup(&reference),
                        reference,
                    });
                    emitted += 1;
                }
            }
        }

        Ok(candidates)
    }
}
