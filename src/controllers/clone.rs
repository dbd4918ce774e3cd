use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::{
    domain::clone::{
        ClonePipeline, ClonePipelineApi, CloneVoiceResponse, HistoryService, HistoryServiceApi,
        SampleUpload, VoiceCloneRecord,
    },
    error::{AppError, AppResult},
};

pub struct CloneController {
    pipeline: Arc<ClonePipeline>,
    history_service: Arc<HistoryService>,
}

impl CloneController {
    pub fn new(pipeline: Arc<ClonePipeline>, history_service: Arc<HistoryService>) -> Self {
        Self {
            pipeline,
            history_service,
        }
    }

    /// POST /api/voice/clone - Clone a voice from a sample and synthesize text with it
    ///
    /// Multipart fields: `audio` (binary, audio/*) and `text` (string).
    pub async fn clone_voice(
        State(controller): State<Arc<CloneController>>,
        multipart: Multipart,
    ) -> AppResult<Json<CloneVoiceResponse>> {
        let (sample, text) = read_clone_request(multipart).await?;

        let outcome = controller
            .pipeline
            .run(sample, &text)
            .await
            .map_err(AppError::from)?;

        Ok(Json(CloneVoiceResponse::from(outcome)))
    }

    /// GET /api/voice/history - List past generations, newest first
    pub async fn list_history(
        State(controller): State<Arc<CloneController>>,
    ) -> AppResult<Json<Vec<VoiceCloneRecord>>> {
        let records = controller
            .history_service
            .list()
            .await
            .map_err(AppError::from)?;
        Ok(Json(records))
    }
}

/// Pull the `audio` and `text` fields out of the multipart payload. Field-level
/// validation (audio content type, non-empty text) belongs to the pipeline; this
/// only rejects payloads that are structurally unreadable or missing fields.
async fn read_clone_request(mut multipart: Multipart) -> AppResult<(SampleUpload, String)> {
    let mut sample: Option<SampleUpload> = None;
    let mut text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "audio" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field
                    .file_name()
                    .unwrap_or("voice-sample")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(format!("Failed to read audio field: {}", e))
                    })?
                    .to_vec();
                sample = Some(SampleUpload {
                    data,
                    content_type,
                    file_name,
                });
            }
            "text" => {
                text = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read text field: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let sample =
        sample.ok_or_else(|| AppError::BadRequest("Audio sample is required".to_string()))?;
    let text = text.ok_or_else(|| AppError::BadRequest("Text is required".to_string()))?;

    Ok((sample, text))
}
