use async_trait::async_trait;

/// Repository for the external voice-cloning provider.
/// Abstracts the provider API (ElevenLabs today, anything with the same shape tomorrow)
///
/// A voice created through `create_voice` is transient: the caller owns the returned
/// id and is expected to delete it before its pipeline run ends.
#[async_trait]
pub trait VoiceCloneRepository: Send + Sync {
    /// Register a transient voice profile from a raw audio sample.
    ///
    /// Returns the provider-assigned opaque voice id.
    ///
    /// # Errors
    /// Returns error if the provider rejects the sample or is unavailable
    async fn create_voice(
        &self,
        name: &str,
        sample: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String>;

    /// Synthesize speech from `text` using a previously created voice.
    ///
    /// Returns raw audio bytes ready for playback. Voice settings are a fixed
    /// provider-side policy, not caller-configurable.
    ///
    /// # Errors
    /// Returns error if synthesis fails or the voice id is unknown
    async fn synthesize(&self, voice_id: &str, text: &str) -> Result<Vec<u8>, String>;

    /// Delete a voice profile from the provider.
    ///
    /// # Errors
    /// Returns error if the delete is rejected; callers treat this as best-effort
    async fn delete_voice(&self, voice_id: &str) -> Result<(), String>;
}
