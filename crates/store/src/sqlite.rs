//! SQLite backend.
//!
//! One database file with two tables:
//! - `conversations` — the per-profile append log of dialogue turns
//! - `query_analytics` — one row per chat turn for usage analysis
//!
//! Insertion order (the autoincrement rowid) is the ordering authority
//! for history reads; timestamps are stored for humans, not for sorting.

use ainbondhu_core::error::StoreError;
use ainbondhu_core::message::Role;
use ainbondhu_core::store::{AnalyticsRecord, StoredTurn};
use ainbondhu_core::ConversationStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database in tests.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                iid        INTEGER PRIMARY KEY AUTOINCREMENT,
                id         TEXT UNIQUE NOT NULL,
                profile_id TEXT NOT NULL,
                role       TEXT NOT NULL,
                content    TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("conversations table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_profile ON conversations(profile_id, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("profile index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_analytics (
                iid                INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id         TEXT NOT NULL,
                user_query         TEXT NOT NULL,
                intent_detected    TEXT,
                tools_used         TEXT NOT NULL DEFAULT '[]',
                sections_retrieved INTEGER NOT NULL DEFAULT 0,
                tokens_used        INTEGER NOT NULL DEFAULT 0,
                response_time_ms   INTEGER NOT NULL DEFAULT 0,
                model              TEXT NOT NULL DEFAULT '',
                success            INTEGER NOT NULL DEFAULT 0,
                error_message      TEXT,
                created_at         TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("query_analytics table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn store_message(
        &self,
        profile_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO conversations (id, profile_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(profile_id)
        .bind(role.as_str())
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT conversation: {e}")))?;

        Ok(id)
    }

    async fn history(&self, profile_id: &str, limit: usize) -> Result<Vec<StoredTurn>, StoreError> {
        // Last `limit` rows by insertion order, returned oldest first.
        let rows = sqlx::query(
            r#"
            SELECT role, content FROM (
                SELECT iid, role, content FROM conversations
                WHERE profile_id = ?1
                ORDER BY iid DESC
                LIMIT ?2
            ) ORDER BY iid ASC
            "#,
        )
        .bind(profile_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("history: {e}")))?;

        rows.iter()
            .map(|row| {
                let role: String = row
                    .try_get("role")
                    .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;
                let content: String = row
                    .try_get("content")
                    .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
                Ok(StoredTurn { role: Role::parse_lossy(&role), content })
            })
            .collect()
    }

    async fn log_analytics(&self, record: AnalyticsRecord) -> Result<(), StoreError> {
        let tools_used = serde_json::to_string(&record.tools_used)
            .map_err(|e| StoreError::Storage(format!("tools_used serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO query_analytics
                (profile_id, user_query, intent_detected, tools_used, sections_retrieved,
                 tokens_used, response_time_ms, model, success, error_message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&record.profile_id)
        .bind(&record.user_query)
        .bind(&record.intent_detected)
        .bind(&tools_used)
        .bind(record.sections_retrieved as i64)
        .bind(record.tokens_used as i64)
        .bind(record.response_time_ms as i64)
        .bind(&record.model)
        .bind(record.success as i64)
        .bind(&record.error_message)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT analytics: {e}")))?;

        Ok(())
    }

    async fn intent_analytics(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT intent_detected, COUNT(*) AS cnt FROM query_analytics
            WHERE intent_detected IS NOT NULL
            GROUP BY intent_detected
            ORDER BY cnt DESC, intent_detected ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("intent analytics: {e}")))?;

        rows.iter()
            .map(|row| {
                let intent: String = row
                    .try_get("intent_detected")
                    .map_err(|e| StoreError::QueryFailed(format!("intent column: {e}")))?;
                let count: i64 = row
                    .try_get("cnt")
                    .map_err(|e| StoreError::QueryFailed(format!("cnt column: {e}")))?;
                Ok((intent, count as u64))
            })
            .collect()
    }
}
