//! A write-once-per-path pool of file descriptors.
//!
//! Locking is the resolver's job (one reader/writer lock covers both the
//! descriptor cache and this pool, per the crate's concurrency model);
//! this type is the plain, lock-free pool itself.

use crate::error::{McpError, McpResult};
use prost_reflect::{DescriptorPool, MessageDescriptor};
use prost_types::FileDescriptorProto;

/// Registers every file in `files` into `pool`, skipping any that it
/// already has (or that otherwise fail to build, which is treated the
/// same as already-present — duplicate registrations are never errors).
pub fn register_files(pool: &mut DescriptorPool, files: Vec<FileDescriptorProto>) {
    for file in files {
        let _ = pool.add_file_descriptor_proto(file);
    }
}

/// Looks up `message_name` (fully qualified) in `pool`.
pub fn find_message(pool: &DescriptorPool, message_name: &str) -> McpResult<MessageDescriptor> {
    pool.get_message_by_name(message_name)
        .ok_or_else(|| McpError::TypeNotFound(message_name.to_string()))
}
