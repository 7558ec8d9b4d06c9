//! Dynamic schema resolution: reference parsing, the bounded descriptor
//! cache, the process-wide schema pool, the registry HTTP client, and the
//! resolver that ties them together.

mod cache;
mod client;
mod descriptor_json;
mod pool;
pub mod reference;
mod resolver;

pub use client::RegistryClient;
pub use reference::{parse_reference, SchemaReference, REGISTRY_HOST};
pub use resolver::{Resolver, SearchCandidate};
