pub mod error;
pub mod model;
pub mod service;

pub use error::ClonePipelineError;
pub use model::{NewVoiceClone, SampleUpload, VoiceCloneRecord};
pub use service::{
    CloneOutcome, ClonePipeline, ClonePipelineApi, HistoryService, HistoryServiceApi,
};

use serde::{Deserialize, Serialize};

/// Response for POST /api/voice/clone
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneVoiceResponse {
    pub download_url: String,
    pub record: VoiceCloneRecord,
}

impl From<CloneOutcome> for CloneVoiceResponse {
    fn from(outcome: CloneOutcome) -> Self {
        Self {
            download_url: outcome.download_url,
            record: outcome.record,
        }
    }
}
