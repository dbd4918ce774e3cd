use super::error::ClonePipelineError;
use super::model::{NewVoiceClone, SampleUpload, VoiceCloneRecord};
use crate::infrastructure::repositories::{
    HistoryRepository, StorageRepository, VoiceCloneRepository,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Name registered with the cloning provider; the profile lives for one run only,
/// so a fixed label is enough.
const VOICE_NAME: &str = "Custom Voice";

const OUTPUT_CONTENT_TYPE: &str = "audio/mpeg";
const OUTPUT_FILE_NAME: &str = "generated.mp3";

/// Result of one successful pipeline run.
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub download_url: String,
    pub record: VoiceCloneRecord,
}

pub struct ClonePipeline {
    storage_repo: Arc<dyn StorageRepository>,
    voice_repo: Arc<dyn VoiceCloneRepository>,
    history_repo: Arc<dyn HistoryRepository>,
    input_bucket: String,
    output_bucket: String,
}

impl ClonePipeline {
    pub fn new(
        storage_repo: Arc<dyn StorageRepository>,
        voice_repo: Arc<dyn VoiceCloneRepository>,
        history_repo: Arc<dyn HistoryRepository>,
        input_bucket: String,
        output_bucket: String,
    ) -> Self {
        Self {
            storage_repo,
            voice_repo,
            history_repo,
            input_bucket,
            output_bucket,
        }
    }
}

#[async_trait]
pub trait ClonePipelineApi: Send + Sync {
    /// Run one clone-and-synthesize request end to end.
    ///
    /// Ordered steps, each feeding the next:
    /// 1. Store the input sample, obtaining its public URL
    /// 2. Register a transient voice profile from the sample
    /// 3. Synthesize speech from `text` with that voice
    /// 4. Store the generated audio, obtaining the download URL
    /// 5. Persist the history record
    /// 6. Delete the voice profile (best effort, always attempted once the
    ///    profile exists, on success and failure paths alike)
    ///
    /// Each external call is attempted exactly once; there are no retries.
    async fn run(
        &self,
        sample: SampleUpload,
        text: &str,
    ) -> Result<CloneOutcome, ClonePipelineError>;
}

#[async_trait]
impl ClonePipelineApi for ClonePipeline {
    async fn run(
        &self,
        sample: SampleUpload,
        text: &str,
    ) -> Result<CloneOutcome, ClonePipelineError> {
        validate(&sample, text)?;

        tracing::info!(
            file_name = %sample.file_name,
            content_type = %sample.content_type,
            sample_size = sample.data.len(),
            text_length = text.len(),
            "Starting clone pipeline run"
        );

        // 1. Store the input sample
        let input_name = object_name(&sample.file_name);
        let input_url = self
            .storage_repo
            .upload(
                &self.input_bucket,
                &input_name,
                &sample.content_type,
                sample.data.clone(),
            )
            .await
            .map_err(ClonePipelineError::Storage)?;

        tracing::info!(input_url = %input_url, "Input sample stored");

        // 2. Register the voice profile. From here on the handle must not leak:
        // every path below goes through the cleanup step before returning.
        let voice_id = self
            .voice_repo
            .create_voice(VOICE_NAME, sample.data, &sample.content_type)
            .await
            .map_err(ClonePipelineError::CloneService)?;

        tracing::info!(voice_id = %voice_id, "Voice profile registered");

        // 3-5. Synthesize, store the output, persist the record. The result is
        // captured so the delete below runs exactly once regardless of outcome.
        let result = self.finish_run(&voice_id, &input_url, text).await;

        // 6. Cleanup. A failing delete is observed but never escalated; the
        // handle is leaked only if the process dies before reaching this point.
        if let Err(e) = self.voice_repo.delete_voice(&voice_id).await {
            tracing::warn!(
                voice_id = %voice_id,
                error = %e,
                "Failed to delete voice profile; handle may be leaked"
            );
        }

        if let Err(e) = &result {
            tracing::error!(step = e.step(), error = %e, "Clone pipeline run failed");
        }

        result
    }
}

impl ClonePipeline {
    /// Steps 3-5: everything that happens while a voice handle is held.
    async fn finish_run(
        &self,
        voice_id: &str,
        input_url: &str,
        text: &str,
    ) -> Result<CloneOutcome, ClonePipelineError> {
        // 3. Synthesize speech with the cloned voice
        let audio = self
            .voice_repo
            .synthesize(voice_id, text)
            .await
            .map_err(ClonePipelineError::Synthesis)?;

        tracing::info!(voice_id = %voice_id, audio_size = audio.len(), "Speech synthesized");

        // 4. Store the generated audio
        let output_name = object_name(OUTPUT_FILE_NAME);
        let output_url = self
            .storage_repo
            .upload(
                &self.output_bucket,
                &output_name,
                OUTPUT_CONTENT_TYPE,
                audio,
            )
            .await
            .map_err(ClonePipelineError::Storage)?;

        tracing::info!(output_url = %output_url, "Generated audio stored");

        // 5. Persist the history record
        let record = self
            .history_repo
            .insert(NewVoiceClone {
                input_url: input_url.to_string(),
                output_url: output_url.clone(),
                text: text.to_string(),
            })
            .await
            .map_err(ClonePipelineError::Persistence)?;

        tracing::info!(record_id = %record.id, "History record persisted");

        Ok(CloneOutcome {
            download_url: output_url,
            record,
        })
    }
}

/// Read-only history listing for the history view. Shares the data model with
/// the pipeline but none of its steps.
pub struct HistoryService {
    history_repo: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    pub fn new(history_repo: Arc<dyn HistoryRepository>) -> Self {
        Self { history_repo }
    }
}

#[async_trait]
pub trait HistoryServiceApi: Send + Sync {
    /// All past generations, newest first.
    async fn list(&self) -> Result<Vec<VoiceCloneRecord>, ClonePipelineError>;
}

#[async_trait]
impl HistoryServiceApi for HistoryService {
    async fn list(&self) -> Result<Vec<VoiceCloneRecord>, ClonePipelineError> {
        self.history_repo
            .list_recent()
            .await
            .map_err(ClonePipelineError::Persistence)
    }
}

fn validate(sample: &SampleUpload, text: &str) -> Result<(), ClonePipelineError> {
    if sample.data.is_empty() {
        return Err(ClonePipelineError::Validation(
            "Audio sample is required".to_string(),
        ));
    }
    if !sample.is_audio() {
        return Err(ClonePipelineError::Validation(format!(
            "Expected an audio/* sample, got '{}'",
            sample.content_type
        )));
    }
    if text.trim().is_empty() {
        return Err(ClonePipelineError::Validation(
            "Text cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Object name for storage: millisecond timestamp for sortability plus a UUID
/// so concurrent uploads of the same filename can never collide.
fn object_name(file_name: &str) -> String {
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "audio".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    struct FakeStorage {
        // (bucket, object_name) per upload, in call order
        uploads: Mutex<Vec<(String, String)>>,
        // 1-based call index that should fail, if any
        fail_on_call: Option<usize>,
    }

    impl FakeStorage {
        fn new() -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                fail_on_call: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                fail_on_call: Some(call),
            }
        }
    }

    #[async_trait]
    impl StorageRepository for FakeStorage {
        async fn upload(
            &self,
            bucket: &str,
            object_name: &str,
            _content_type: &str,
            _data: Vec<u8>,
        ) -> Result<String, String> {
            let mut uploads = self.uploads.lock();
            if self.fail_on_call == Some(uploads.len() + 1) {
                return Err("storage unavailable".to_string());
            }
            uploads.push((bucket.to_string(), object_name.to_string()));
            Ok(format!("https://store.test/{}/{}", bucket, object_name))
        }
    }

    struct FakeVoices {
        created: Mutex<Vec<String>>,
        synthesized: Mutex<Vec<(String, String)>>,
        deleted: Mutex<Vec<String>>,
        fail_create: bool,
        fail_synthesize: bool,
        fail_delete: bool,
    }

    impl FakeVoices {
        fn new() -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                synthesized: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
                fail_create: false,
                fail_synthesize: false,
                fail_delete: false,
            }
        }
    }

    #[async_trait]
    impl VoiceCloneRepository for FakeVoices {
        async fn create_voice(
            &self,
            name: &str,
            _sample: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, String> {
            if self.fail_create {
                return Err("provider rejected sample".to_string());
            }
            let voice_id = format!("voice-{}", self.created.lock().len() + 1);
            self.created.lock().push(name.to_string());
            Ok(voice_id)
        }

        async fn synthesize(&self, voice_id: &str, text: &str) -> Result<Vec<u8>, String> {
            if self.fail_synthesize {
                return Err("synthesis blew up".to_string());
            }
            self.synthesized
                .lock()
                .push((voice_id.to_string(), text.to_string()));
            Ok(vec![0u8; 128])
        }

        async fn delete_voice(&self, voice_id: &str) -> Result<(), String> {
            self.deleted.lock().push(voice_id.to_string());
            if self.fail_delete {
                return Err("delete rejected".to_string());
            }
            Ok(())
        }
    }

    struct FakeHistory {
        rows: Mutex<Vec<VoiceCloneRecord>>,
        fail_insert: bool,
    }

    impl FakeHistory {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                fail_insert: false,
            }
        }
    }

    #[async_trait]
    impl HistoryRepository for FakeHistory {
        async fn insert(&self, record: NewVoiceClone) -> Result<VoiceCloneRecord, String> {
            if self.fail_insert {
                return Err("insert failed".to_string());
            }
            let row = VoiceCloneRecord {
                id: Uuid::new_v4(),
                input_url: record.input_url,
                output_url: record.output_url,
                text: record.text,
                created_at: Utc::now(),
            };
            self.rows.lock().push(row.clone());
            Ok(row)
        }

        async fn list_recent(&self) -> Result<Vec<VoiceCloneRecord>, String> {
            let mut rows = self.rows.lock().clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }
    }

    fn sample() -> SampleUpload {
        SampleUpload {
            data: vec![1u8; 10 * 1024],
            content_type: "audio/wav".to_string(),
            file_name: "sample.wav".to_string(),
        }
    }

    fn pipeline(
        storage: Arc<FakeStorage>,
        voices: Arc<FakeVoices>,
        history: Arc<FakeHistory>,
    ) -> ClonePipeline {
        ClonePipeline::new(
            storage,
            voices,
            history,
            "voice-inputs".to_string(),
            "voice-outputs".to_string(),
        )
    }

    #[tokio::test]
    async fn test_successful_run_calls_each_service_exactly_once() {
        let storage = Arc::new(FakeStorage::new());
        let voices = Arc::new(FakeVoices::new());
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage.clone(), voices.clone(), history.clone());

        let outcome = pipeline.run(sample(), "Hello world").await.unwrap();

        let uploads = storage.uploads.lock();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, "voice-inputs");
        assert_eq!(uploads[1].0, "voice-outputs");
        assert_eq!(voices.created.lock().len(), 1);
        assert_eq!(
            *voices.synthesized.lock(),
            vec![("voice-1".to_string(), "Hello world".to_string())]
        );
        assert_eq!(*voices.deleted.lock(), vec!["voice-1".to_string()]);
        assert_eq!(history.rows.lock().len(), 1);

        // The download URL is the stored output object's URL
        assert_eq!(
            outcome.download_url,
            format!("https://store.test/voice-outputs/{}", uploads[1].1)
        );
        assert_eq!(outcome.record.output_url, outcome.download_url);
        assert_eq!(outcome.record.text, "Hello world");
    }

    #[tokio::test]
    async fn test_record_text_matches_input_exactly() {
        let storage = Arc::new(FakeStorage::new());
        let voices = Arc::new(FakeVoices::new());
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage, voices, history.clone());

        let text = "  Hello,   world! 123 \u{e9}\u{e8}  ";
        let outcome = pipeline.run(sample(), text).await.unwrap();

        assert_eq!(outcome.record.text, text);
        assert_eq!(history.rows.lock()[0].text, text);
    }

    #[tokio::test]
    async fn test_synthesis_failure_still_deletes_the_voice() {
        let storage = Arc::new(FakeStorage::new());
        let mut voices = FakeVoices::new();
        voices.fail_synthesize = true;
        let voices = Arc::new(voices);
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage, voices.clone(), history.clone());

        let err = pipeline.run(sample(), "Hello").await.unwrap_err();

        assert!(matches!(err, ClonePipelineError::Synthesis(_)));
        assert_eq!(*voices.deleted.lock(), vec!["voice-1".to_string()]);
        assert!(history.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_input_storage_failure_aborts_before_any_other_call() {
        let storage = Arc::new(FakeStorage::failing_on(1));
        let voices = Arc::new(FakeVoices::new());
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage.clone(), voices.clone(), history.clone());

        let err = pipeline.run(sample(), "Hello").await.unwrap_err();

        assert!(matches!(err, ClonePipelineError::Storage(_)));
        assert!(storage.uploads.lock().is_empty());
        assert!(voices.created.lock().is_empty());
        assert!(voices.deleted.lock().is_empty());
        assert!(history.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_output_storage_failure_still_deletes_the_voice() {
        let storage = Arc::new(FakeStorage::failing_on(2));
        let voices = Arc::new(FakeVoices::new());
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage, voices.clone(), history.clone());

        let err = pipeline.run(sample(), "Hello").await.unwrap_err();

        assert!(matches!(err, ClonePipelineError::Storage(_)));
        assert_eq!(voices.deleted.lock().len(), 1);
        assert!(history.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_still_deletes_the_voice() {
        let storage = Arc::new(FakeStorage::new());
        let voices = Arc::new(FakeVoices::new());
        let mut history = FakeHistory::new();
        history.fail_insert = true;
        let pipeline = pipeline(storage, voices.clone(), Arc::new(history));

        let err = pipeline.run(sample(), "Hello").await.unwrap_err();

        assert!(matches!(err, ClonePipelineError::Persistence(_)));
        assert_eq!(voices.deleted.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_fail_the_run() {
        let storage = Arc::new(FakeStorage::new());
        let mut voices = FakeVoices::new();
        voices.fail_delete = true;
        let voices = Arc::new(voices);
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage, voices.clone(), history.clone());

        let outcome = pipeline.run(sample(), "Hello").await.unwrap();

        assert_eq!(outcome.record.text, "Hello");
        assert_eq!(voices.deleted.lock().len(), 1);
        assert_eq!(history.rows.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_any_external_call() {
        let storage = Arc::new(FakeStorage::new());
        let voices = Arc::new(FakeVoices::new());
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage.clone(), voices.clone(), history.clone());

        for text in ["", "   ", "\n\t"] {
            let err = pipeline.run(sample(), text).await.unwrap_err();
            assert!(matches!(err, ClonePipelineError::Validation(_)));
        }

        assert!(storage.uploads.lock().is_empty());
        assert!(voices.created.lock().is_empty());
        assert!(history.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_non_audio_sample_is_rejected() {
        let storage = Arc::new(FakeStorage::new());
        let voices = Arc::new(FakeVoices::new());
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage.clone(), voices.clone(), history);

        let empty = SampleUpload {
            data: Vec::new(),
            content_type: "audio/wav".to_string(),
            file_name: "sample.wav".to_string(),
        };
        let err = pipeline.run(empty, "hello").await.unwrap_err();
        assert!(matches!(err, ClonePipelineError::Validation(_)));

        let not_audio = SampleUpload {
            data: vec![1, 2, 3],
            content_type: "text/plain".to_string(),
            file_name: "notes.txt".to_string(),
        };
        let err = pipeline.run(not_audio, "hello").await.unwrap_err();
        assert!(matches!(err, ClonePipelineError::Validation(_)));

        assert!(storage.uploads.lock().is_empty());
        assert!(voices.created.lock().is_empty());
    }

    #[tokio::test]
    async fn test_identical_inputs_produce_distinct_records_and_urls() {
        let storage = Arc::new(FakeStorage::new());
        let voices = Arc::new(FakeVoices::new());
        let history = Arc::new(FakeHistory::new());
        let pipeline = pipeline(storage.clone(), voices, history.clone());

        let first = pipeline.run(sample(), "Hello world").await.unwrap();
        let second = pipeline.run(sample(), "Hello world").await.unwrap();

        assert_ne!(first.record.id, second.record.id);
        assert_ne!(first.download_url, second.download_url);

        let uploads = storage.uploads.lock();
        assert_eq!(uploads.len(), 4);
        // Input object names differ too, despite identical filenames
        assert_ne!(uploads[0].1, uploads[2].1);
        assert_eq!(history.rows.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_history_lists_newest_first() {
        let history = Arc::new(FakeHistory::new());
        let base = Utc::now();
        for (i, offset) in [1i64, 3, 2].iter().enumerate() {
            history.rows.lock().push(VoiceCloneRecord {
                id: Uuid::new_v4(),
                input_url: format!("in-{}", i),
                output_url: format!("out-{}", i),
                text: format!("text-{}", i),
                created_at: base + Duration::seconds(*offset),
            });
        }
        let service = HistoryService::new(history);

        let listed = service.list().await.unwrap();

        let times: Vec<_> = listed.iter().map(|r| r.created_at).collect();
        assert_eq!(
            times,
            vec![
                base + Duration::seconds(3),
                base + Duration::seconds(2),
                base + Duration::seconds(1)
            ]
        );
    }

    #[test]
    fn test_object_name_is_unique_per_call() {
        let a = object_name("sample.wav");
        let b = object_name("sample.wav");
        assert_ne!(a, b);
        assert!(a.ends_with("-sample.wav"));
    }

    #[test]
    fn test_sanitize_file_name_strips_unsafe_characters() {
        assert_eq!(sanitize_file_name("my voice (1).wav"), "my_voice__1_.wav");
        assert_eq!(sanitize_file_name("normal-name_1.mp3"), "normal-name_1.mp3");
        assert_eq!(sanitize_file_name(""), "audio");
        assert_eq!(sanitize_file_name("ütt.wav"), "_tt.wav");
    }
}
