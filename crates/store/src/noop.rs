//! No-op store — discards everything.
//!
//! Used when a deployment explicitly opts out of persistence. Every chat
//! turn then runs stateless: no history, no analytics.

use ainbondhu_core::error::StoreError;
use ainbondhu_core::message::Role;
use ainbondhu_core::store::{AnalyticsRecord, StoredTurn};
use ainbondhu_core::ConversationStore;
use async_trait::async_trait;
use uuid::Uuid;

pub struct NoopStore;

#[async_trait]
impl ConversationStore for NoopStore {
    fn name(&self) -> &str {
        "noop"
    }

    async fn store_message(
        &self,
        _profile_id: &str,
        _role: Role,
        _content: &str,
    ) -> Result<String, StoreError> {
        Ok(Uuid::new_v4().to_string())
    }

    async fn history(&self, _profile_id: &str, _limit: usize) -> Result<Vec<StoredTurn>, StoreError> {
        Ok(Vec::new())
    }

    async fn log_analytics(&self, _record: AnalyticsRecord) -> Result<(), StoreError> {
        Ok(())
    }
}
