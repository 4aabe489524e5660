//! Conversation and analytics storage backends.
//!
//! All backends implement `ainbondhu_core::ConversationStore`. The store
//! is an append log: turns go in per profile, bounded history comes out
//! oldest-first, and one analytics row is written per chat turn.

use std::sync::Arc;

use ainbondhu_core::error::StoreError;
use ainbondhu_core::ConversationStore;

pub mod in_memory;
pub mod noop;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use noop::NoopStore;
pub use sqlite::SqliteStore;

/// Create a store from a backend name.
///
/// Unknown names are a configuration error; config validation catches
/// them before we get here.
pub async fn create_store(
    backend: &str,
    sqlite_path: &str,
) -> Result<Arc<dyn ConversationStore>, StoreError> {
    match backend {
        "sqlite" => Ok(Arc::new(SqliteStore::new(sqlite_path).await?)),
        "in_memory" => Ok(Arc::new(InMemoryStore::new())),
        "noop" => Ok(Arc::new(NoopStore)),
        other => Err(StoreError::Storage(format!("Unknown store backend: {other}"))),
    }
}
