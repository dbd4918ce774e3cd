use crate::domain::clone::{NewVoiceClone, VoiceCloneRecord};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;

/// Repository for the voice-clone history datastore.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Insert one history row; the store assigns id and created_at.
    async fn insert(&self, record: NewVoiceClone) -> Result<VoiceCloneRecord, String>;

    /// All history rows, newest first.
    async fn list_recent(&self) -> Result<Vec<VoiceCloneRecord>, String>;
}

/// Postgres implementation backed by the shared connection pool.
pub struct PgHistoryRepository {
    pool: Arc<DbPool>,
}

impl PgHistoryRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn insert(&self, record: NewVoiceClone) -> Result<VoiceCloneRecord, String> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, VoiceCloneRecord>(
            r#"
            INSERT INTO voice_clones (id, input_url, output_url, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, input_url, output_url, text, created_at
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&record.input_url)
        .bind(&record.output_url)
        .bind(&record.text)
        .bind(chrono::Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| e.to_string())?;

        Ok(row)
    }

    async fn list_recent(&self) -> Result<Vec<VoiceCloneRecord>, String> {
        let pool = self.pool.as_ref();
        let rows = sqlx::query_as::<_, VoiceCloneRecord>(
            r#"
            SELECT id, input_url, output_url, text, created_at
            FROM voice_clones
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| e.to_string())?;

        Ok(rows)
    }
}
