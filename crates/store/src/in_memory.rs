//! In-memory store — the fallback when no database is configured, and
//! the default for tests. Contents vanish with the process.

use std::collections::HashMap;
use std::sync::Arc;

use ainbondhu_core::error::StoreError;
use ainbondhu_core::message::Role;
use ainbondhu_core::store::{AnalyticsRecord, StoredTurn};
use ainbondhu_core::ConversationStore;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct InMemoryStore {
    conversations: Arc<RwLock<HashMap<String, Vec<StoredTurn>>>>,
    analytics: Arc<RwLock<Vec<AnalyticsRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            analytics: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of analytics rows recorded so far.
    pub async fn analytics_count(&self) -> usize {
        self.analytics.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn store_message(
        &self,
        profile_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, StoreError> {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(profile_id.to_string())
            .or_default()
            .push(StoredTurn { role, content: content.to_string() });
        Ok(Uuid::new_v4().to_string())
    }

    async fn history(&self, profile_id: &str, limit: usize) -> Result<Vec<StoredTurn>, StoreError> {
        let conversations = self.conversations.read().await;
        let turns = conversations.get(profile_id).map(|v| v.as_slice()).unwrap_or_default();
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }

    async fn log_analytics(&self, record: AnalyticsRecord) -> Result<(), StoreError> {
        self.analytics.write().await.push(record);
        Ok(())
    }

    async fn intent_analytics(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let analytics = self.analytics.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for record in analytics.iter() {
            if let Some(intent) = &record.intent_detected {
                *counts.entry(intent.clone()).or_default() += 1;
            }
        }
        let mut sorted: Vec<(String, u64)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_oldest_first_and_bounded() {
        let store = InMemoryStore::new();
        for i in 0..15 {
            store
                .store_message("p1", Role::User, &format!("turn {i}"))
                .await
                .unwrap();
        }

        let history = store.history("p1", 10).await.unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].content, "turn 5");
        assert_eq!(history[9].content, "turn 14");
    }

    #[tokio::test]
    async fn profiles_are_isolated() {
        let store = InMemoryStore::new();
        store.store_message("p1", Role::User, "from p1").await.unwrap();
        store.store_message("p2", Role::User, "from p2").await.unwrap();

        let history = store.history("p1", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "from p1");
    }

    #[tokio::test]
    async fn unknown_profile_has_empty_history() {
        let store = InMemoryStore::new();
        assert!(store.history("missing", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn intent_analytics_counts_and_sorts() {
        let store = InMemoryStore::new();
        for intent in ["dowry", "custody", "dowry", "dowry", "custody"] {
            store
                .log_analytics(AnalyticsRecord {
                    profile_id: "p1".into(),
                    user_query: "q".into(),
                    intent_detected: Some(intent.into()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        // One record without a detected intent; must not appear.
        store
            .log_analytics(AnalyticsRecord {
                profile_id: "p1".into(),
                user_query: "q".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let counts = store.intent_analytics().await.unwrap();
        assert_eq!(counts, vec![("dowry".to_string(), 3), ("custody".to_string(), 2)]);
    }
}
