use crate::error::AppError;

/// Typed failure taxonomy for the clone pipeline. Each variant names the step
/// that failed and wraps the failing call's detail; the HTTP boundary collapses
/// these into one envelope but the taxonomy is kept for logs and tests.
#[derive(Debug, thiserror::Error)]
pub enum ClonePipelineError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("audio storage failed: {0}")]
    Storage(String),
    #[error("voice registration failed: {0}")]
    CloneService(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("history persistence failed: {0}")]
    Persistence(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClonePipelineError {
    /// The pipeline step this failure belongs to, for structured logging.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::CloneService(_) => "register_voice",
            Self::Synthesis(_) => "synthesize",
            Self::Persistence(_) => "persist_record",
            Self::Other(_) => "other",
        }
    }
}

impl From<ClonePipelineError> for AppError {
    fn from(err: ClonePipelineError) -> Self {
        match err {
            ClonePipelineError::Validation(msg) => AppError::BadRequest(msg),
            ClonePipelineError::Persistence(_) => AppError::Internal(err.to_string()),
            ClonePipelineError::Other(e) => AppError::Internal(e.to_string()),
            // Storage, CloneService, Synthesis: an upstream collaborator failed
            other => AppError::ExternalService(other.to_string()),
        }
    }
}
