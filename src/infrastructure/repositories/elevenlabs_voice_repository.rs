use super::voice_clone_repository::VoiceCloneRepository;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";

/// Fixed synthesis policy; these are not user-configurable.
const MODEL_ID: &str = "eleven_monolingual_v1";
const STABILITY: f32 = 0.5;
const SIMILARITY_BOOST: f32 = 0.75;

#[derive(Debug, Deserialize)]
struct AddVoiceResponse {
    voice_id: String,
}

/// ElevenLabs implementation of the voice-clone repository
pub struct ElevenLabsVoiceRepository {
    api_key: String,
    api_base: String,
    http_client: reqwest::Client,
}

impl ElevenLabsVoiceRepository {
    pub fn new(api_key: String, http_client: reqwest::Client) -> Self {
        Self {
            api_key,
            api_base: ELEVENLABS_API_BASE.to_string(),
            http_client,
        }
    }

    async fn error_body(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }
}

#[async_trait]
impl VoiceCloneRepository for ElevenLabsVoiceRepository {
    async fn create_voice(
        &self,
        name: &str,
        sample: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String> {
        let part = reqwest::multipart::Part::bytes(sample)
            .file_name("voice-sample")
            .mime_str(content_type)
            .map_err(|e| format!("Invalid sample content type: {}", e))?;

        let form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .part("files", part);

        let response = self
            .http_client
            .post(format!("{}/voices/add", self.api_base))
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("ElevenLabs voice creation request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = Self::error_body(response).await;
            tracing::error!(
                status = %status.as_u16(),
                error = %error_text,
                "ElevenLabs rejected voice creation"
            );
            return Err(format!(
                "ElevenLabs voice creation failed ({}): {}",
                status, error_text
            ));
        }

        let body: AddVoiceResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse ElevenLabs voice response: {}", e))?;

        tracing::info!(voice_id = %body.voice_id, "ElevenLabs voice created");
        Ok(body.voice_id)
    }

    async fn synthesize(&self, voice_id: &str, text: &str) -> Result<Vec<u8>, String> {
        tracing::info!(
            voice_id = voice_id,
            text_length = text.len(),
            model = MODEL_ID,
            "Calling ElevenLabs text-to-speech"
        );

        let response = self
            .http_client
            .post(format!(
                "{}/text-to-speech/{}/stream",
                self.api_base, voice_id
            ))
            .header("xi-api-key", &self.api_key)
            .json(&json!({
                "text": text,
                "model_id": MODEL_ID,
                "voice_settings": {
                    "stability": STABILITY,
                    "similarity_boost": SIMILARITY_BOOST,
                },
            }))
            .send()
            .await
            .map_err(|e| format!("ElevenLabs synthesis request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = Self::error_body(response).await;
            tracing::error!(
                voice_id = voice_id,
                status = %status.as_u16(),
                error = %error_text,
                "ElevenLabs synthesis failed"
            );
            return Err(format!(
                "ElevenLabs synthesis failed ({}): {}",
                status, error_text
            ));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read ElevenLabs audio stream: {}", e))?;

        tracing::debug!(audio_size = audio.len(), "ElevenLabs synthesis successful");
        Ok(audio.to_vec())
    }

    async fn delete_voice(&self, voice_id: &str) -> Result<(), String> {
        let response = self
            .http_client
            .delete(format!("{}/voices/{}", self.api_base, voice_id))
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| format!("ElevenLabs voice deletion request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = Self::error_body(response).await;
            return Err(format!(
                "ElevenLabs voice deletion failed ({}): {}",
                status, error_text
            ));
        }

        tracing::debug!(voice_id = voice_id, "ElevenLabs voice deleted");
        Ok(())
    }
}
