//! ConversationStore trait — the external append log for dialogue turns.
//!
//! The context manager owns no persistent state: it borrows turns from
//! this store transiently per request. Within one profile the store is the
//! sole enforcer of append order; this core never serializes concurrent
//! writes itself.

use crate::error::StoreError;
use crate::message::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A stored conversation turn, as returned by history queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTurn {
    pub role: Role,
    pub content: String,
}

/// One per-turn analytics record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub profile_id: String,
    pub user_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_detected: Option<String>,
    #[serde(default)]
    pub tools_used: Vec<serde_json::Value>,
    #[serde(default)]
    pub sections_retrieved: usize,
    #[serde(default)]
    pub tokens_used: u32,
    #[serde(default)]
    pub response_time_ms: u64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The conversation store trait.
///
/// Implementations: SQLite, in-memory (tests / unconfigured deployments),
/// no-op.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory", "noop").
    fn name(&self) -> &str;

    /// Append a turn to a profile's conversation. Returns the message ID.
    async fn store_message(
        &self,
        profile_id: &str,
        role: Role,
        content: &str,
    ) -> std::result::Result<String, StoreError>;

    /// The last `limit` turns for a profile, oldest first.
    async fn history(
        &self,
        profile_id: &str,
        limit: usize,
    ) -> std::result::Result<Vec<StoredTurn>, StoreError>;

    /// Append one analytics record. Best-effort: callers log and continue
    /// on failure.
    async fn log_analytics(&self, record: AnalyticsRecord) -> std::result::Result<(), StoreError>;

    /// Analytics rows grouped by detected intent: `(intent, count)`.
    async fn intent_analytics(&self) -> std::result::Result<Vec<(String, u64)>, StoreError> {
        Ok(Vec::new())
    }
}
