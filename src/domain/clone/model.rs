use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One uploaded voice sample, alive only for the duration of a pipeline run.
/// The raw bytes are copied into object storage; the struct itself is never persisted.
#[derive(Debug, Clone)]
pub struct SampleUpload {
    pub data: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl SampleUpload {
    pub fn is_audio(&self) -> bool {
        self.content_type.starts_with("audio/")
    }
}

/// Persisted history row for one completed clone-and-synthesize run.
/// Immutable after insert; the history view only ever lists these newest-first.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VoiceCloneRecord {
    pub id: Uuid,
    pub input_url: String,
    pub output_url: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Row data for an insert; id and created_at are assigned by the datastore.
#[derive(Debug, Clone)]
pub struct NewVoiceClone {
    pub input_url: String,
    pub output_url: String,
    pub text: String,
}
